use chrono::{Duration, NaiveDate};

use crate::common::{TestApp, entry_form, routes};

mod pagination {
    use super::*;

    async fn seed_entries(app: &TestApp, count: i64) {
        let token = app.login().await;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        for i in 0..count {
            let date = (start + Duration::days(i)).format("%Y-%m-%d").to_string();
            app.create_entry(&token, &date, &format!("Entry {i}")).await;
        }
    }

    #[tokio::test]
    async fn pages_hold_twenty_entries_newest_first() {
        let app = TestApp::spawn().await;
        seed_entries(&app, 45).await;

        let res = app.get(routes::ENTRIES).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let pagination = &res.body["pagination"];
        assert_eq!(pagination["page"], 1);
        assert_eq!(pagination["per_page"], 20);
        assert_eq!(pagination["total"], 45);
        assert_eq!(pagination["total_pages"], 3);

        let data = res.body["data"].as_array().unwrap();
        assert_eq!(data.len(), 20);
        assert_eq!(data[0]["entry_date"], "2024-02-14");
        assert_eq!(data[19]["entry_date"], "2024-01-26");

        let res = app.get(&routes::entries_page(3)).await;
        assert_eq!(res.body["data"].as_array().unwrap().len(), 5);
        assert_eq!(res.body["pagination"]["page"], 3);
    }

    #[tokio::test]
    async fn out_of_range_pages_clamp_instead_of_erroring() {
        let app = TestApp::spawn().await;
        seed_entries(&app, 45).await;

        // Too high clamps to the last page and says so.
        let res = app.get(&routes::entries_page(99)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["page"], 3);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 5);

        // Zero clamps to the first page.
        let res = app.get(&routes::entries_page(0)).await;
        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["pagination"]["page"], 1);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 20);
    }

    #[tokio::test]
    async fn empty_feed_reports_page_one_of_zero() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::entries_page(5)).await;
        assert_eq!(res.status, 200, "{}", res.text);

        let pagination = &res.body["pagination"];
        assert_eq!(pagination["page"], 1);
        assert_eq!(pagination["total"], 0);
        assert_eq!(pagination["total_pages"], 0);
        assert!(res.body["data"].as_array().unwrap().is_empty());
    }
}

mod detail {
    use super::*;

    #[tokio::test]
    async fn body_markdown_is_escaped_then_rendered() {
        let app = TestApp::spawn().await;
        let token = app.login().await;

        let form = entry_form(
            Some("2024-03-05"),
            "Rendered",
            "Results were **strong**. <script>alert(1)</script>",
        );
        let res = app.post_multipart(routes::ADMIN_ENTRIES, form, &token).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let res = app.get(&routes::entry(res.id())).await;
        let html = res.body["body_html"].as_str().unwrap();
        assert!(html.contains("<strong>strong</strong>"), "got {html}");
        assert!(!html.contains("<script>"), "raw HTML must not pass through");
        assert!(html.contains("&lt;script&gt;"), "got {html}");
    }

    #[tokio::test]
    async fn missing_entry_is_404() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::entry(424242)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }
}
