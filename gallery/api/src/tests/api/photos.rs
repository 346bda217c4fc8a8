use reqwest::multipart::{Form, Part};
use reqwest::{header, StatusCode};
use serde_json::Value;
use serial_test::serial;

use super::{bearer, location, TestServer};
use crate::access;
use crate::database::Album;
use crate::drive::AnyDrive;
use crate::global::GalleryState;
use crate::store::Store;
use crate::tests::access::photo as stored_photo;
use crate::tests::forms::PNG;

fn upload(title: &str, album: Option<&str>) -> Form {
	let image = Part::bytes(PNG)
		.file_name("sunset.png")
		.mime_str("image/png")
		.expect("valid mime type");

	let form = Form::new().text("title", title.to_string()).part("image", image);
	match album {
		Some(album) => form.text("album", album.to_string()),
		None => form,
	}
}

async fn file_count(server: &TestServer) -> usize {
	match server.global.drive() {
		AnyDrive::Memory(drive) => drive.file_count().await,
		AnyDrive::Local(_) => unreachable!("tests run on the memory drive"),
	}
}

#[serial]
#[tokio::test]
async fn test_serial_photo_upload() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let (name, token) = bearer(&server.token(&alice).await);

	let album = Album::new(alice.id, "album".to_string(), String::new(), true);
	server.global.store().insert_album(&album).await.expect("failed to insert album");

	let res = server
		.post("/photo/new/")
		.header(name.clone(), &token)
		.multipart(upload("Sunset", Some(&album.id.to_string())))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/photos/"));

	let photos = access::owned_photos(server.global.store(), alice.id)
		.await
		.expect("failed to list photos");
	assert_eq!(photos.len(), 1);
	let photo = &photos[0];
	assert_eq!(photo.album_id, Some(album.id));
	assert!(!photo.is_public);
	assert!(photo.image.starts_with("photos/"), "{}", photo.image);
	assert!(photo.image.ends_with(".png"), "{}", photo.image);
	assert_eq!(file_count(&server).await, 1);

	// private photos are hidden from anonymous visitors, even inside a public album
	let res = server
		.get(&format!("/photo/{}/", photo.id))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let res = server
		.get(&format!("/album/{}/", album.id))
		.send()
		.await
		.expect("failed to send");
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["photos"].as_array().map(Vec::len), Some(0));

	let res = server
		.get(&format!("/photo/{}/", photo.id))
		.header(name.clone(), &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["photo"]["title"], "Sunset");
	assert_eq!(body["album"]["title"], "album");
	assert_eq!(body["photo"]["image_url"], format!("/photo/{}/image/", photo.id));

	let res = server
		.get(&format!("/photo/{}/image/", photo.id))
		.header(name.clone(), &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	assert_eq!(
		res.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()),
		Some("image/png")
	);
	assert_eq!(&res.bytes().await.expect("failed to read body")[..], PNG);

	let res = server
		.post(&format!("/photo/{}/delete/", photo.id))
		.header(name, &token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some("/photos/"));
	assert_eq!(file_count(&server).await, 0);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_photo_foreign_album() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let bob = server.user("bob", false).await;
	let (name, token) = bearer(&server.token(&bob).await);

	let album = Album::new(alice.id, "alice's".to_string(), String::new(), true);
	server.global.store().insert_album(&album).await.expect("failed to insert album");

	let res = server
		.post("/photo/new/")
		.header(name, &token)
		.multipart(upload("Sneaky", Some(&album.id.to_string())))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body: Value = res.json().await.expect("failed to read body");
	assert!(body["errors"]["album"].is_array());

	let photos = access::owned_photos(server.global.store(), bob.id)
		.await
		.expect("failed to list photos");
	assert!(photos.is_empty());
	assert_eq!(file_count(&server).await, 0);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_photo_not_an_image() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let (name, token) = bearer(&server.token(&alice).await);

	let form = Form::new().text("title", "Notes").part(
		"image",
		Part::bytes(&b"just some text"[..])
			.file_name("notes.png")
			.mime_str("image/png")
			.expect("valid mime type"),
	);

	let res = server
		.post("/photo/new/")
		.header(name, &token)
		.multipart(form)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body: Value = res.json().await.expect("failed to read body");
	assert!(body["errors"]["image"].is_array());
	assert_eq!(file_count(&server).await, 0);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_superuser_and_dashboard() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let admin = server.user("admin", true).await;
	let (alice_header, alice_token) = bearer(&server.token(&alice).await);
	let (admin_header, admin_token) = bearer(&server.token(&admin).await);

	let album = Album::new(alice.id, "album".to_string(), String::new(), false);
	server.global.store().insert_album(&album).await.expect("failed to insert album");

	for title in ["first", "second"] {
		let res = server
			.post("/photo/new/")
			.header(alice_header.clone(), &alice_token)
			.multipart(upload(title, Some(&album.id.to_string())))
			.send()
			.await
			.expect("failed to send");
		assert_eq!(res.status(), StatusCode::FOUND);
	}

	let res = server
		.get("/dashboard/")
		.header(alice_header.clone(), &alice_token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["album_count"], 1);
	assert_eq!(body["photo_count"], 2);
	assert_eq!(body["albums"][0]["photo_count"], 2);
	assert_eq!(body["photos"][0]["title"], "second");

	// the admin sees nothing private but may still change it
	let res = server
		.get(&format!("/album/{}/", album.id))
		.header(admin_header.clone(), &admin_token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::NOT_FOUND);

	let res = server
		.post(&format!("/album/{}/delete/", album.id))
		.header(admin_header, &admin_token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(file_count(&server).await, 0);

	let res = server
		.get("/dashboard/")
		.header(alice_header, &alice_token)
		.send()
		.await
		.expect("failed to send");
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["album_count"], 0);
	assert_eq!(body["photo_count"], 0);

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_photo_hides_private_album() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let (name, token) = bearer(&server.token(&alice).await);

	let hidden = Album::new(alice.id, "hidden".to_string(), String::new(), false);
	let shown = Album::new(alice.id, "shown".to_string(), String::new(), true);
	for album in [&hidden, &shown] {
		server.global.store().insert_album(album).await.expect("failed to insert album");
	}

	let in_hidden = stored_photo(&alice, Some(hidden.id), true);
	let in_shown = stored_photo(&alice, Some(shown.id), true);
	for photo in [&in_hidden, &in_shown] {
		server.global.store().insert_photo(photo).await.expect("failed to insert photo");
	}

	let res = server
		.get(&format!("/photo/{}/", in_hidden.id))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert!(body["album"].is_null());
	assert!(body["photo"]["album_id"].is_null());

	let res = server
		.get(&format!("/photo/{}/", in_shown.id))
		.send()
		.await
		.expect("failed to send");
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["album"]["title"], "shown");
	assert_eq!(body["photo"]["album_id"], shown.id.to_string());

	let res = server.get("/photos/").send().await.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	let photos = body["photos"].as_array().expect("photos should be a list");
	assert_eq!(photos.len(), 2);
	for view in photos {
		if view["id"] == in_hidden.id.to_string() {
			assert!(view["album_id"].is_null());
		} else {
			assert_eq!(view["album_id"], shown.id.to_string());
		}
	}

	// the owner still sees where the photo is filed
	let res = server
		.get(&format!("/photo/{}/", in_hidden.id))
		.header(name, &token)
		.send()
		.await
		.expect("failed to send");
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["album"]["title"], "hidden");
	assert_eq!(body["photo"]["album_id"], hidden.id.to_string());

	server.shutdown().await;
}

#[serial]
#[tokio::test]
async fn test_serial_photo_edit() {
	let server = TestServer::start().await;
	let alice = server.user("alice", false).await;
	let admin = server.user("admin", true).await;
	let (alice_header, alice_token) = bearer(&server.token(&alice).await);
	let (admin_header, admin_token) = bearer(&server.token(&admin).await);

	let album = Album::new(alice.id, "alice's".to_string(), String::new(), true);
	let admins = Album::new(admin.id, "admin's".to_string(), String::new(), true);
	for album in [&album, &admins] {
		server.global.store().insert_album(album).await.expect("failed to insert album");
	}

	let res = server
		.post("/photo/new/")
		.header(alice_header.clone(), &alice_token)
		.multipart(upload("Sunset", None))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);

	let photos = access::owned_photos(server.global.store(), alice.id)
		.await
		.expect("failed to list photos");
	let original = photos[0].clone();
	let edit_path = format!("/photo/{}/edit/", original.id);
	let album_id = album.id.to_string();
	let admins_id = admins.id.to_string();

	// album choices follow the photo's owner, not the editor
	let res = server
		.get(&edit_path)
		.header(admin_header.clone(), &admin_token)
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::OK);
	let body: Value = res.json().await.expect("failed to read body");
	assert_eq!(body["form"]["values"]["title"], "Sunset");
	let choices = body["form"]["album_choices"].as_array().expect("choices should be a list");
	assert_eq!(choices.len(), 1);
	assert_eq!(choices[0]["id"], album_id);

	let res = server
		.post(&edit_path)
		.header(admin_header.clone(), &admin_token)
		.form(&[("title", "Moved"), ("album", admins_id.as_str())])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::BAD_REQUEST);
	let body: Value = res.json().await.expect("failed to read body");
	assert!(body["errors"]["album"].is_array());

	let res = server
		.post(&edit_path)
		.header(admin_header, &admin_token)
		.form(&[("title", "Moved"), ("album", album_id.as_str()), ("is_public", "on")])
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);
	assert_eq!(location(&res), Some(format!("/photo/{}/", original.id).as_str()));

	let stored = server
		.global
		.store()
		.photo_by_id(original.id)
		.await
		.expect("failed to query")
		.expect("photo should exist");
	assert_eq!(stored.owner_id, alice.id);
	assert_eq!(stored.title, "Moved");
	assert_eq!(stored.album_id, Some(album.id));
	assert!(stored.is_public);
	assert_eq!(stored.image, original.image);

	// a new image replaces the old file
	let res = server
		.post(&edit_path)
		.header(alice_header, &alice_token)
		.multipart(upload("Replaced", None))
		.send()
		.await
		.expect("failed to send");
	assert_eq!(res.status(), StatusCode::FOUND);

	let stored = server
		.global
		.store()
		.photo_by_id(original.id)
		.await
		.expect("failed to query")
		.expect("photo should exist");
	assert_eq!(stored.owner_id, alice.id);
	assert_eq!(stored.title, "Replaced");
	assert_eq!(stored.album_id, None);
	assert_ne!(stored.image, original.image);
	assert_eq!(file_count(&server).await, 1);

	server.shutdown().await;
}
