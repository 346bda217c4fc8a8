use reqwest::StatusCode;
use serde_json::Value;
use serial_test::serial;

use super::{bearer, location, TestServer};
use crate::access;
use crate::database::Album;
use crate::global::GalleryState;
use crate::store::Store;

#[serial]
#[tokio::test]
async fn test_serial_album_lifecycle() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let (name, token) = bearer(&server.token(&alice).await);

	let res = server
		.post("/album/new/")
		.header(name.clone(), &token)
		.form(&[("title", "Holidays"), ("description", "Summer"), ("is_public", "on")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/"));
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["message"], "Album created successfully!");

	let albums = access::owned_albums(server.global.store(), alice.id)
		.await
		.expect("failed to list albums");
	assert_eq!(albums.len(), 1);
	let album = &albums[0];
	assert_eq!(album.title, "Holidays");
	assert!(album.is_public);

	// anonymous visitors see public albums
	let res = server.get("/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["albums"][0]["title"], "Holidays");
	assert_eq!(body["albums"][0]["owner"]["username"], "alice");
	assert_eq!(body["page"]["count"], 1);

	let res = server
		.post(&format!("/album/{}/edit/", album.id))
		.header(name.clone(), &token)
		.form(&[("title", "Renamed")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some(format!("/album/{}/", album.id).as_str()));

	let stored = server
		.global
		.store()
		.album_by_id(album.id)
		.await
		.expect("failed to query")
		.expect("album should exist");
	assert_eq!(stored.title, "Renamed");
	assert!(!stored.is_public);
	assert_eq!(stored.owner_id, alice.id);

	// now private, so hidden from everyone else
	let res = server
		.get(&format!("/album/{}/", album.id))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let res = server
		.get(&format!("/album/{}/", album.id))
		.header(name.clone(), &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["can_edit"], true);

	let res = server
		.post(&format!("/album/{}/delete/", album.id))
		.header(name, &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert!(server
		.global
		.store()
		.album_by_id(album.id)
		.await
		.expect("failed to query")
		.is_none());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_album_permissions() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let bob = server.user("bob", false).await;

	let public = Album::new(alice.id, "public".to_string(), String::new(), true);
	let private = Album::new(alice.id, "private".to_string(), String::new(), false);
	for album in [&public, &private] {
		server.global.store().insert_album(album).await.expect("failed to insert album");
	}

	let (name, token) = bearer(&server.token(&bob).await);

	let res = server
		.get(&format!("/album/{}/", private.id))
		.header(name.clone(), &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let res = server
		.get(&format!("/album/{}/", public.id))
		.header(name.clone(), &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["can_edit"], false);

	// visible but not theirs
	for path in [format!("/album/{}/edit/", public.id), format!("/album/{}/delete/", public.id)] {
		let res = server.post(&path).header(name.clone(), &token).send().await.expect("failed to send");
		assert_eq!(res.status(), StatusCode::FORBIDDEN, "{path}");
	}

	// hidden and not theirs
	let res = server
		.post(&format!("/album/{}/edit/", private.id))
		.header(name.clone(), &token)
		.form(&[("title", "mine now")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	// a repeated delete answers the same way and removes nothing
	for _ in 0..2 {
		let res = server
			.post(&format!("/album/{}/delete/", private.id))
			.header(name.clone(), &token)
			.send()
			.await
			.expect("failed to send");
		assert_eq!(res.status(), StatusCode::NOT_FOUND);
	}

	let res = server.get("/").header(name, &token).send().await.expect("failed to send");
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["page"]["count"], 1);

	for album in [&public, &private] {
		let stored = server
			.global
			.store()
			.album_by_id(album.id)
			.await
			.expect("failed to query")
			.expect("album should still exist");
		assert_eq!(stored.title, album.title);
		assert_eq!(stored.owner_id, album.owner_id);
	}

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_album_login_required() {
	let server = TestServer::start().await;

	let res = server.get("/album/new/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/accounts/login/?next=%2Falbum%2Fnew%2F"));

	let res = server
		.post("/album/new/")
		.form(&[("title", "sneaky")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);

	let res = server.get("/").send().await.expect("failed to send");
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["page"]["count"], 0);
	assert!(body["user"].is_null());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_album_invalid_form() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let (name, token) = bearer(&server.token(&alice).await);

	let res = server
		.post("/album/new/")
		.header(name, &token)
		.form(&[("title", "  ")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body: Value = res.json().await.expect("failed to read body");
	assert!(body["errors"]["title"].is_array());

	server.shutdown().await;
}
