use blogsync_core::{
    transcode, ClientConfig, Credentials, EntryKind, ErrorKind, RemoteLocation, RemotePath,
    RevisionToken, StoreError,
};
use blogsync_storage::{ContentBackend, GitHubBackend, PutRequest, RemoteContent};
use mockito::Matcher;
use serde_json::json;

fn backend_for(server: &mockito::Server) -> GitHubBackend {
    let config = ClientConfig::new(RemoteLocation::new("octo", "blog", "main"))
        .with_endpoints(&server.url(), &format!("{}/raw", server.url()))
        .with_timeout_secs(5);
    GitHubBackend::new(&config).unwrap()
}

fn path(p: &str) -> RemotePath {
    RemotePath::parse(p).unwrap()
}

fn put_request(text: &str, sha: Option<&str>) -> PutRequest {
    PutRequest {
        message: "Update post: a.md".to_string(),
        content: transcode::encode_text(text),
        branch: "main".to_string(),
        sha: sha.map(RevisionToken::new),
    }
}

#[tokio::test]
async fn file_metadata_uses_encoded_path_and_branch_ref() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octo/blog/contents/posts/%E4%BD%A0%E5%A5%BD%20world.md")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "type": "file",
                "name": "你好 world.md",
                "path": "posts/你好 world.md",
                "sha": "abc123",
                "size": 5,
                "download_url": "https://raw.example.com/octo/blog/main/posts/x.md",
                "content": "aGVsbG8=\n",
                "encoding": "base64"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let backend = backend_for(&server);
    let content = backend.get_contents(&path("posts/你好 world.md"), None).await.unwrap();

    mock.assert_async().await;
    let RemoteContent::File(meta) = content else {
        panic!("expected file metadata");
    };
    assert_eq!(meta.revision, RevisionToken::new("abc123"));
    assert_eq!(meta.name, "你好 world.md");
    assert_eq!(transcode::decode_text(meta.content.as_deref().unwrap()).unwrap(), "hello");
}

#[tokio::test]
async fn root_listing_hits_contents_without_trailing_slash() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octo/blog/contents")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .with_status(200)
        .with_body(
            json!([
                {"type": "dir", "name": "posts", "path": "posts", "sha": "d1", "size": 0},
                {"type": "file", "name": "README.md", "path": "README.md", "sha": "f1", "size": 12,
                 "download_url": "https://raw.example.com/octo/blog/main/README.md"}
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let backend = backend_for(&server);
    let RemoteContent::Dir(entries) = backend.get_contents(&RemotePath::root(), None).await.unwrap()
    else {
        panic!("expected a listing");
    };

    mock.assert_async().await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].kind, EntryKind::Dir);
    assert_eq!(entries[1].kind, EntryKind::File);
    assert_eq!(entries[1].size, 12);
}

#[tokio::test]
async fn missing_path_is_not_found() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/octo/blog/contents/nope")
        .match_query(Matcher::Any)
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let err = backend_for(&server)
        .get_contents(&path("nope"), None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn put_sends_token_branch_and_sha() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/repos/octo/blog/contents/posts/a.md")
        .match_header("authorization", "token ghp_test")
        .match_body(Matcher::PartialJson(json!({
            "message": "Update post: a.md",
            "content": transcode::encode_text("新内容"),
            "branch": "main",
            "sha": "old-sha"
        })))
        .with_status(200)
        .with_body(
            json!({
                "content": {"type": "file", "name": "a.md", "path": "posts/a.md", "sha": "new-sha", "size": 9},
                "commit": {"sha": "c0ffee", "message": "Update post: a.md"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    let outcome = backend_for(&server)
        .put_file(
            &path("posts/a.md"),
            &put_request("新内容", Some("old-sha")),
            &Credentials::new("ghp_test"),
        )
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(outcome.revision, RevisionToken::new("new-sha"));
    assert_eq!(outcome.commit_sha.as_deref(), Some("c0ffee"));
}

#[tokio::test]
async fn create_omits_sha_field() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/repos/octo/blog/contents/posts/new.md")
        .match_body(Matcher::Json(json!({
            "message": "Update post: a.md",
            "content": transcode::encode_text("x"),
            "branch": "main"
        })))
        .with_status(201)
        .with_body(
            json!({
                "content": {"type": "file", "name": "new.md", "path": "posts/new.md", "sha": "s1", "size": 1},
                "commit": {"sha": "c1"}
            })
            .to_string(),
        )
        .create_async()
        .await;

    backend_for(&server)
        .put_file(&path("posts/new.md"), &put_request("x", None), &Credentials::new("t"))
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn write_conflicts_are_classified() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("PUT", "/repos/octo/blog/contents/posts/stale.md")
        .with_status(409)
        .with_body(r#"{"message":"posts/stale.md does not match 1234"}"#)
        .create_async()
        .await;
    server
        .mock("PUT", "/repos/octo/blog/contents/posts/exists.md")
        .with_status(422)
        .with_body(r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#)
        .create_async()
        .await;
    server
        .mock("PUT", "/repos/octo/blog/contents/posts/bad.md")
        .with_status(422)
        .with_body(r#"{"message":"content is not valid Base64"}"#)
        .create_async()
        .await;
    server
        .mock("PUT", "/repos/octo/blog/contents/posts/private.md")
        .with_status(404)
        .with_body(r#"{"message":"Not Found"}"#)
        .create_async()
        .await;

    let backend = backend_for(&server);
    let creds = Credentials::new("t");

    let err = backend
        .put_file(&path("posts/stale.md"), &put_request("x", Some("1234")), &creds)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.to_string().contains("does not match"));

    let err = backend
        .put_file(&path("posts/exists.md"), &put_request("x", None), &creds)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = backend
        .put_file(&path("posts/bad.md"), &put_request("x", None), &creds)
        .await
        .unwrap_err();
    match err {
        StoreError::Rejected { status, message } => {
            assert_eq!(status, 422);
            assert_eq!(message, "content is not valid Base64");
        }
        other => panic!("expected rejection, got {:?}", other),
    }

    let err = backend
        .put_file(&path("posts/private.md"), &put_request("x", None), &creds)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Rejected);
}

#[tokio::test]
async fn raw_fetch_carries_cache_buster() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/raw/octo/blog/main/posts/%E6%97%A5%E8%AE%B0.md")
        .match_query(Matcher::Regex(r"^t=\d+$".to_string()))
        .with_status(200)
        .with_body("# 日记")
        .create_async()
        .await;

    let body = backend_for(&server)
        .fetch_raw(&path("posts/日记.md"), true)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(std::str::from_utf8(&body).unwrap(), "# 日记");
}

#[tokio::test]
async fn tree_listing_is_recursive() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octo/blog/git/trees/main")
        .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
        .with_status(200)
        .with_body(
            json!({
                "sha": "root",
                "tree": [
                    {"path": "posts", "type": "tree", "sha": "t1"},
                    {"path": "posts/a.md", "type": "blob", "sha": "b1", "size": 3}
                ],
                "truncated": true
            })
            .to_string(),
        )
        .create_async()
        .await;

    let tree = backend_for(&server).list_tree().await.unwrap();
    mock.assert_async().await;
    assert!(tree.truncated);
    assert_eq!(tree.entries[1].path, "posts/a.md");
    assert_eq!(tree.entries[1].size, Some(3));
}

#[tokio::test]
async fn unreachable_endpoint_is_transient() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let base = format!("http://{}", addr);
    let config = ClientConfig::new(RemoteLocation::new("octo", "blog", "main"))
        .with_endpoints(&base, &base)
        .with_timeout_secs(2);
    let backend = GitHubBackend::new(&config).unwrap();

    let err = backend.get_contents(&path("posts"), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::TransientNetwork);
}

#[tokio::test]
async fn authenticated_metadata_read_sends_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/octo/blog/contents/posts/private.md")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .match_header("authorization", "token ghp_test")
        .with_status(200)
        .with_body(
            json!({"type": "file", "name": "private.md", "path": "posts/private.md", "sha": "p1", "size": 1})
                .to_string(),
        )
        .create_async()
        .await;

    let content = backend_for(&server)
        .get_contents(&path("posts/private.md"), Some(&Credentials::new("ghp_test")))
        .await
        .unwrap();

    mock.assert_async().await;
    let RemoteContent::File(meta) = content else {
        panic!("expected file metadata");
    };
    assert_eq!(meta.revision, RevisionToken::new("p1"));
}
