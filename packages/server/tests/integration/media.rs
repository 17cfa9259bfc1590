use tokio::io::{AsyncReadExt, AsyncWriteExt};

use crate::common::{TestApp, entry_form, image_part, routes};

#[tokio::test]
async fn serves_stored_images_with_their_content_type() {
    let app = TestApp::spawn().await;
    let token = app.login().await;

    let form = entry_form(Some("2024-03-05"), "With photo", "Body.")
        .part("photos", image_part("plate.jpg", b"jpeg-payload"))
        .text("photo_caption", "Plate");
    let res = app.post_multipart(routes::ADMIN_ENTRIES, form, &token).await;
    assert_eq!(res.status, 201, "{}", res.text);

    let entry = app.get(&routes::entry(res.id())).await;
    let url = entry.body["photos"][0]["url"].as_str().unwrap().to_string();

    let (status, content_type, bytes) = app.get_raw(&url).await;
    assert_eq!(status, 200);
    assert_eq!(content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(bytes, b"jpeg-payload");
}

#[tokio::test]
async fn missing_files_are_404() {
    let app = TestApp::spawn().await;

    let (status, _, _) = app.get_raw("/media/2024/03/05/photo-doesnotexist.jpg").await;

    assert_eq!(status, 404);
}

#[tokio::test]
async fn path_traversal_is_rejected() {
    let app = TestApp::spawn().await;

    // HTTP clients normalize "../" away before sending, so issue the raw
    // request line directly.
    let mut stream = tokio::net::TcpStream::connect(app.addr)
        .await
        .expect("Failed to connect");
    let request = format!(
        "GET /media/../../etc/passwd HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        app.addr
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    let status_line = response.lines().next().unwrap_or_default();
    assert!(
        status_line.contains("404"),
        "expected 404, got: {status_line}"
    );
}
