/// End-to-end loads against a local HTTP server
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use exhibilo_core::{Decoders, ModelFormat};
use exhibilo_viewer::session::drain;
use exhibilo_viewer::{
    AssetLoader, AssetReference, LoadError, LoadSession, Resolver, UploadedBlob, Viewer,
    ViewerState,
};
use parking_lot::Mutex;
use url::Url;

const STAND_STL: &str = "\
solid stand
  facet normal 0 0 1
    outer loop
      vertex 0 0 0
      vertex 10 0 0
      vertex 0 5 0
    endloop
  endfacet
endsolid stand
";

const PANEL_OBJ: &str = "o panel\nv 0 0 0\nv 1 0 0\nv 0 3 0\nf 1 2 3\n";

/// Triangle (0,0,0) (4,0,0) (0,2,0) kept in `stand.bin` next to the file
const STAND_GLTF: &str = r#"{
  "asset": { "version": "2.0" },
  "scenes": [{ "nodes": [0] }],
  "nodes": [{ "mesh": 0 }],
  "meshes": [{ "primitives": [{ "attributes": { "POSITION": 0 }, "indices": 1 }] }],
  "buffers": [{ "uri": "stand.bin", "byteLength": 42 }],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 6 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3",
      "min": [0.0, 0.0, 0.0], "max": [4.0, 2.0, 0.0] },
    { "bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR" }
  ]
}"#;

#[rustfmt::skip]
const STAND_BIN: [u8; 42] = [
    0, 0, 0, 0,    0, 0, 0, 0,    0, 0, 0, 0,
    0, 0, 0x80, 0x40,    0, 0, 0, 0,    0, 0, 0, 0,
    0, 0, 0, 0,    0, 0, 0, 0x40,    0, 0, 0, 0,
    0, 0, 1, 0, 2, 0,
];

#[derive(Clone)]
struct Entry {
    content_type: &'static str,
    body: &'static [u8],
    delay: Duration,
}

#[derive(Clone, Default)]
struct Files {
    entries: Arc<HashMap<&'static str, Entry>>,
    log: Arc<Mutex<Vec<(Method, String)>>>,
}

impl Files {
    fn requests(&self) -> Vec<(Method, String)> {
        self.log.lock().clone()
    }
}

async fn serve(State(files): State<Files>, method: Method, uri: Uri) -> Response {
    files.log.lock().push((method.clone(), uri.path().to_owned()));

    let Some(entry) = files.entries.get(uri.path()).cloned() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    tokio::time::sleep(entry.delay).await;

    let body = if method == Method::HEAD { &[][..] } else { entry.body };
    ([(header::CONTENT_TYPE, entry.content_type)], body).into_response()
}

async fn start_server() -> (Url, Files) {
    let mut entries = HashMap::new();
    entries.insert(
        "/models/stand.stl",
        Entry {
            content_type: "model/stl",
            body: STAND_STL.as_bytes(),
            delay: Duration::ZERO,
        },
    );
    entries.insert(
        "/models/slow.stl",
        Entry {
            content_type: "application/octet-stream",
            body: STAND_STL.as_bytes(),
            delay: Duration::from_millis(400),
        },
    );
    entries.insert(
        "/models/panel.obj",
        Entry {
            content_type: "text/plain",
            body: PANEL_OBJ.as_bytes(),
            delay: Duration::ZERO,
        },
    );
    entries.insert(
        "/models/gltf/stand.gltf",
        Entry {
            content_type: "model/gltf+json",
            body: STAND_GLTF.as_bytes(),
            delay: Duration::ZERO,
        },
    );
    entries.insert(
        "/models/gltf/stand.bin",
        Entry {
            content_type: "application/octet-stream",
            body: &STAND_BIN,
            delay: Duration::ZERO,
        },
    );
    // what a single-page app answers for unknown paths
    entries.insert(
        "/models/page.glb",
        Entry {
            content_type: "text/html; charset=utf-8",
            body: b"<!doctype html><html></html>",
            delay: Duration::ZERO,
        },
    );

    let files = Files {
        entries: Arc::new(entries),
        ..Files::default()
    };
    let app = Router::new().fallback(serve).with_state(files.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (Url::parse(&format!("http://{addr}/")).unwrap(), files)
}

fn loader(origin: Url) -> AssetLoader {
    AssetLoader::new(Resolver::new(origin), Decoders::new())
}

#[tokio::test]
async fn test_remote_model_is_checked_then_fetched() {
    let (origin, files) = start_server().await;
    let loader = loader(origin);

    let model = loader
        .load(AssetReference::Remote("/models/stand.stl?v=3".into()), |_| {})
        .await
        .unwrap();

    assert_eq!(model.format(), ModelFormat::Stl);
    assert_eq!(model.asset.triangle_count(), 1);
    assert!((model.extent() - 2.5).abs() < 1e-4);
    assert_eq!(
        files.requests(),
        vec![
            (Method::HEAD, "/models/stand.stl".to_owned()),
            (Method::GET, "/models/stand.stl".to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_remote_gltf_fetches_its_buffer_beside_it() {
    let (origin, files) = start_server().await;
    let model = loader(origin)
        .load(AssetReference::Remote("/models/gltf/stand.gltf".into()), |_| {})
        .await
        .unwrap();

    assert_eq!(model.format(), ModelFormat::GltfJson);
    assert_eq!(model.asset.triangle_count(), 1);
    assert!((model.extent() - 2.5).abs() < 1e-4);
    assert_eq!(
        files.requests(),
        vec![
            (Method::HEAD, "/models/gltf/stand.gltf".to_owned()),
            (Method::GET, "/models/gltf/stand.gltf".to_owned()),
            (Method::GET, "/models/gltf/stand.bin".to_owned()),
        ]
    );
}

#[tokio::test]
async fn test_uploaded_gltf_must_embed_its_buffers() {
    let (origin, files) = start_server().await;
    let err = loader(origin)
        .load(
            AssetReference::Upload(UploadedBlob::new("stand.gltf", STAND_GLTF)),
            |_| {},
        )
        .await
        .unwrap_err();

    match err {
        LoadError::DecodeFailed(reason) => assert!(reason.contains("stand.bin"), "{reason}"),
        other => panic!("expected a decode failure, got {other:?}"),
    }
    assert!(files.requests().is_empty());
}

#[tokio::test]
async fn test_missing_model_is_not_downloaded() {
    let (origin, files) = start_server().await;
    let err = loader(origin.clone())
        .load(AssetReference::Remote("/models/missing.glb".into()), |_| {})
        .await
        .unwrap_err();

    assert_eq!(
        err,
        LoadError::NotFound {
            status: 404,
            url: origin.join("/models/missing.glb").unwrap().to_string(),
        }
    );
    assert_eq!(files.requests(), vec![(Method::HEAD, "/models/missing.glb".to_owned())]);
}

#[tokio::test]
async fn test_html_response_is_rejected() {
    let (origin, files) = start_server().await;
    let err = loader(origin)
        .load(AssetReference::Remote("/models/page.glb".into()), |_| {})
        .await
        .unwrap_err();

    match err {
        LoadError::InvalidContentType { content_type, .. } => {
            assert!(content_type.starts_with("text/html"));
        }
        other => panic!("expected invalid content type, got {other:?}"),
    }
    assert_eq!(files.requests().len(), 1);
}

#[tokio::test]
async fn test_unsupported_extension_makes_no_request() {
    let (origin, files) = start_server().await;
    let err = loader(origin)
        .load(AssetReference::Remote("/models/stand.fbx".into()), |_| {})
        .await
        .unwrap_err();

    assert_eq!(err, LoadError::UnsupportedFormat { extension: "fbx".into() });
    assert!(files.requests().is_empty());
}

#[tokio::test]
async fn test_unreachable_server_is_a_fetch_failure() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let origin = Url::parse(&format!("http://{addr}/")).unwrap();
    let err = loader(origin)
        .load(AssetReference::Remote("/models/stand.stl".into()), |_| {})
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::FetchFailed { .. }), "{err:?}");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_newer_load_wins_over_slower_older_one() {
    let (origin, _files) = start_server().await;
    let (session, mut updates) =
        LoadSession::new(tokio::runtime::Handle::current(), loader(origin));
    let mut viewer = Viewer::new();

    let (_, slow) = session.start(&mut viewer, AssetReference::Remote("/models/slow.stl".into()));
    let (_, fast) = session.start(&mut viewer, AssetReference::Remote("/models/panel.obj".into()));
    fast.await.unwrap();
    slow.await.unwrap();

    drain(&mut viewer, &mut updates);
    match viewer.state() {
        ViewerState::Ready(model) => {
            assert_eq!(model.name, "/models/panel.obj");
            assert_eq!(model.format(), ModelFormat::Obj);
        }
        other => panic!("expected the newer model, got {other:?}"),
    }
}

#[tokio::test]
async fn test_uploads_release_their_object_url_once() {
    let (origin, _files) = start_server().await;
    let loader = loader(origin);

    loader
        .load(
            AssetReference::Upload(UploadedBlob::new("mine.stl", STAND_STL)),
            |_| {},
        )
        .await
        .unwrap();
    let err = loader
        .load(
            AssetReference::Upload(UploadedBlob::new(
                "broken.glb",
                &b"glTF\x02\x00\x00\x00garbage"[..],
            )),
            |_| {},
        )
        .await
        .unwrap_err();
    assert!(matches!(err, LoadError::DecodeFailed(_)), "{err:?}");

    let urls = loader.resolver().object_urls();
    assert_eq!(urls.live_count(), 0);
    assert_eq!(urls.released_count(), 2);
}
