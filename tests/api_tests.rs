use std::{
	io::Cursor,
	sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	},
};

use async_trait::async_trait;
use axum::{
	body::Body,
	http::{
		header::{AUTHORIZATION, CONTENT_TYPE},
		Method, Request, StatusCode,
	},
	Router,
};
use chrono::{Duration, Utc};
use classifieds_server::{
	config::Config,
	file_server::{LocalStorage, ObjectStorage, StorageError},
	listings::listing::{Category, CategoryDetails, Listing},
	routes::build_router,
	state::AppState,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

type TestResult<T = ()> = anyhow::Result<T>;

const BOUNDARY: &str = "classifieds-test-boundary";

struct TestContext {
	temp_dir: TempDir,
	state: AppState,
	max_upload_bytes: usize,
}

impl TestContext {
	fn new() -> TestResult<Self> {
		let temp_dir = TempDir::new()?;
		let root = temp_dir.path().display().to_string();
		let config = Config::from_lookup(|key| match key {
			"STORE_BACKEND" => Some("memory".to_string()),
			"STORAGE_ROOT" => Some(root.clone()),
			"JWT_SECRET" => Some("test-secret".to_string()),
			_ => None,
		})?;
		Ok(Self {
			temp_dir,
			state: AppState::in_memory(&config),
			max_upload_bytes: config.max_upload_bytes,
		})
	}

	fn with_storage(mut self, storage: Arc<dyn ObjectStorage>) -> Self {
		self.state = self.state.with_storage(storage);
		self
	}

	fn router(&self) -> Router {
		build_router(self.state.clone(), self.max_upload_bytes)
	}

	async fn send(&self, request: Request<Body>) -> TestResult<(StatusCode, Value)> {
		let response = self.router().oneshot(request).await?;
		let status = response.status();
		let bytes = response.into_body().collect().await?.to_bytes();
		let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
		Ok((status, body))
	}

	async fn register(&self, name: &str, email: &str) -> TestResult<(String, String)> {
		let (status, body) = self
			.send(json_request(Method::POST, "/user/new", None, json!({ "name": name, "email": email, "password": "secret1" })))
			.await?;
		assert_eq!(status, StatusCode::CREATED, "{body}");
		Ok((
			body["token"].as_str().unwrap_or_default().to_string(),
			body["profile"]["uid"].as_str().unwrap_or_default().to_string(),
		))
	}

	async fn seed(&self, id: &str, owner: &str, category: Category, days_ago: i64) -> TestResult<()> {
		let listing = Listing {
			id: id.to_string(),
			title: format!("Listing {id}"),
			description: "Seeded".to_string(),
			price: 1500.0,
			category,
			images: vec![format!("http://localhost:4000/files/products/{owner}/{id}.png")],
			owner: owner.to_string(),
			created_at: Utc::now() - Duration::days(days_ago),
			is_boosted: false,
			boosted_until: None,
			details: CategoryDetails::None,
		};
		self.state.listings.insert(&listing).await?;
		Ok(())
	}
}

struct FailingStorage;

#[async_trait]
impl ObjectStorage for FailingStorage {
	async fn upload(&self, _key: &str, _data: &[u8]) -> Result<String, StorageError> {
		Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "bucket unavailable")))
	}
}

/// Stores the first `succeed` uploads on disk, then fails every later one.
struct FlakyStorage {
	disk: LocalStorage,
	succeed: usize,
	calls: AtomicUsize,
}

#[async_trait]
impl ObjectStorage for FlakyStorage {
	async fn upload(&self, key: &str, data: &[u8]) -> Result<String, StorageError> {
		if self.calls.fetch_add(1, Ordering::SeqCst) < self.succeed {
			return self.disk.upload(key, data).await;
		}
		Err(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "connection reset")))
	}
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(uri).header(CONTENT_TYPE, "application/json");
	if let Some(token) = token {
		builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: Method, uri: &str, token: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder().method(method).uri(uri);
	if let Some(token) = token {
		builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::empty()).unwrap()
}

fn png() -> Vec<u8> {
	let mut bytes = Vec::new();
	image::DynamicImage::ImageRgb8(image::RgbImage::new(4, 4))
		.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
		.unwrap();
	bytes
}

fn multipart(fields: &[(&str, &str)], files: &[(&str, Vec<u8>)]) -> Vec<u8> {
	let mut body = Vec::new();
	for (name, value) in fields {
		body.extend_from_slice(format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n").as_bytes());
	}
	for (file_name, data) in files {
		body.extend_from_slice(
			format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"images\"; filename=\"{file_name}\"\r\nContent-Type: image/png\r\n\r\n")
				.as_bytes(),
		);
		body.extend_from_slice(data);
		body.extend_from_slice(b"\r\n");
	}
	body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
	body
}

fn multipart_request(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
	let mut builder = Request::builder()
		.method(Method::POST)
		.uri(uri)
		.header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
	if let Some(token) = token {
		builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
	}
	builder.body(Body::from(body)).unwrap()
}

fn ids(feed: &Value) -> Vec<String> {
	feed["listings"]
		.as_array()
		.map(|cards| cards.iter().filter_map(|c| c["id"].as_str().map(str::to_string)).collect())
		.unwrap_or_default()
}

#[tokio::test]
async fn health_check() -> TestResult {
	let ctx = TestContext::new()?;
	let (status, body) = ctx.send(empty_request(Method::GET, "/health", None)).await?;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "ok");
	Ok(())
}

#[tokio::test]
async fn register_login_and_duplicate_email() -> TestResult {
	let ctx = TestContext::new()?;
	let (token, uid) = ctx.register("Asha", "asha@example.com").await?;
	assert!(!token.is_empty());

	let (status, body) = ctx
		.send(json_request(Method::POST, "/user/login", None, json!({ "email": "ASHA@example.com", "password": "secret1" })))
		.await?;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["profile"]["uid"], uid.as_str());

	let (status, _) = ctx
		.send(json_request(Method::POST, "/user/login", None, json!({ "email": "asha@example.com", "password": "wrong-one" })))
		.await?;
	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let (status, _) = ctx
		.send(json_request(Method::POST, "/user/new", None, json!({ "name": "Other", "email": "asha@example.com", "password": "secret1" })))
		.await?;
	assert_eq!(status, StatusCode::CONFLICT);

	let (status, body) = ctx
		.send(json_request(Method::POST, "/user/new", None, json!({ "name": "Short", "email": "s@example.com", "password": "abc" })))
		.await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "Password should be at least 6 characters");
	Ok(())
}

#[tokio::test]
async fn logout_invalidates_the_token() -> TestResult {
	let ctx = TestContext::new()?;
	let (token, _) = ctx.register("Ravi", "ravi@example.com").await?;

	let (status, body) = ctx.send(empty_request(Method::GET, "/user/profile", Some(&token))).await?;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["name"], "Ravi");

	let (status, _) = ctx.send(empty_request(Method::POST, "/user/logout", Some(&token))).await?;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (status, _) = ctx.send(empty_request(Method::GET, "/user/profile", Some(&token))).await?;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	Ok(())
}

#[tokio::test]
async fn posting_requires_a_session() -> TestResult {
	let ctx = TestContext::new()?;
	let body = multipart(&[("title", "Bike"), ("description", "d"), ("category", "Bikes"), ("price", "10")], &[("a.png", png())]);
	let (status, _) = ctx.send(multipart_request("/listing/new", None, body)).await?;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
	Ok(())
}

#[tokio::test]
async fn create_listing_then_view_it() -> TestResult {
	let ctx = TestContext::new()?;
	let (token, uid) = ctx.register("Meera", "meera@example.com").await?;

	let body = multipart(
		&[
			("title", "Maruti Swift VXI"),
			("description", "Single owner, serviced"),
			("category", "Cars"),
			("price", "450000"),
			("year", "2018"),
			("fuel_type", "Petrol"),
			("transmission", "Manual"),
			("bedrooms", "3"),
		],
		&[("front.png", png()), ("back.png", png())],
	);
	let (status, created) = ctx.send(multipart_request("/listing/new", Some(&token), body)).await?;
	assert_eq!(status, StatusCode::CREATED, "{created}");
	assert_eq!(created["owner"], uid.as_str());
	assert_eq!(created["is_boosted"], false);
	assert_eq!(created["details"]["kind"], "cars");
	assert_eq!(created["details"]["year"], 2018);
	assert!(created["details"].get("bedrooms").is_none());

	let images = created["images"].as_array().cloned().unwrap_or_default();
	assert_eq!(images.len(), 2);
	let first = images[0].as_str().unwrap_or_default();
	assert!(first.contains(&format!("/files/products/{uid}/")), "{first}");

	let path = first.trim_start_matches("http://localhost:4000");
	let response = ctx.router().oneshot(empty_request(Method::GET, path, None)).await?;
	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(response.headers()[CONTENT_TYPE], "image/png");

	let id = created["id"].as_str().unwrap_or_default();
	let (status, detail) = ctx.send(empty_request(Method::GET, &format!("/listing/{id}?image=3"), None)).await?;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(detail["price_label"], "₹4,50,000");
	assert_eq!(detail["image_index"], 1);
	assert_eq!(detail["next_image"], 0);
	assert_eq!(detail["seller"]["name"], "Meera");
	assert_eq!(detail["featured"], false);
	Ok(())
}

#[tokio::test]
async fn invalid_forms_are_rejected() -> TestResult {
	let ctx = TestContext::new()?;
	let (token, _) = ctx.register("Kiran", "kiran@example.com").await?;

	let no_images = multipart(&[("title", "Sofa"), ("description", "d"), ("category", "Furniture"), ("price", "10")], &[]);
	let (status, body) = ctx.send(multipart_request("/listing/new", Some(&token), no_images)).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "Please upload at least one image");

	let negative = multipart(&[("title", "Sofa"), ("description", "d"), ("category", "Furniture"), ("price", "-5")], &[("s.png", png())]);
	let (status, body) = ctx.send(multipart_request("/listing/new", Some(&token), negative)).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "Price cannot be negative");

	let not_image = multipart(&[("title", "Sofa"), ("description", "d"), ("category", "Furniture"), ("price", "5")], &[("s.png", b"plain text".to_vec())]);
	let (status, _) = ctx.send(multipart_request("/listing/new", Some(&token), not_image)).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (_, feed) = ctx.send(empty_request(Method::GET, "/listings", None)).await?;
	assert_eq!(feed["count"], 0);
	Ok(())
}

#[tokio::test]
async fn failed_upload_writes_no_record() -> TestResult {
	let ctx = TestContext::new()?.with_storage(Arc::new(FailingStorage));
	let (token, _) = ctx.register("Dev", "dev@example.com").await?;

	let body = multipart(&[("title", "Phone"), ("description", "d"), ("category", "Mobiles"), ("price", "9000")], &[("p.png", png())]);
	let (status, body) = ctx.send(multipart_request("/listing/new", Some(&token), body)).await?;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "Failed to create listing. Please try again.");

	let (_, feed) = ctx.send(empty_request(Method::GET, "/listings", None)).await?;
	assert_eq!(feed["empty"], true);
	Ok(())
}

#[tokio::test]
async fn later_upload_failure_leaves_earlier_images_behind() -> TestResult {
	let ctx = TestContext::new()?;
	let flaky = FlakyStorage {
		disk: LocalStorage::new(ctx.temp_dir.path(), "http://localhost:4000"),
		succeed: 1,
		calls: AtomicUsize::new(0),
	};
	let ctx = ctx.with_storage(Arc::new(flaky));
	let (token, uid) = ctx.register("Dev", "dev@example.com").await?;

	let body = multipart(
		&[("title", "Phone"), ("description", "d"), ("category", "Mobiles"), ("price", "9000")],
		&[("one.png", png()), ("two.png", png()), ("three.png", png())],
	);
	let (status, body) = ctx.send(multipart_request("/listing/new", Some(&token), body)).await?;
	assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
	assert_eq!(body["error"], "Failed to create listing. Please try again.");

	let stored: Vec<String> = std::fs::read_dir(ctx.temp_dir.path().join("products").join(&uid))?
		.filter_map(|entry| entry.ok())
		.map(|entry| entry.file_name().to_string_lossy().into_owned())
		.collect();
	assert_eq!(stored.len(), 1, "{stored:?}");
	assert!(stored[0].ends_with("_0_one.png"), "{stored:?}");

	let (_, feed) = ctx.send(empty_request(Method::GET, "/listings", None)).await?;
	assert_eq!(feed["empty"], true);
	let (_, mine) = ctx.send(empty_request(Method::GET, "/user/listings", Some(&token))).await?;
	assert_eq!(mine["count"], 0);
	Ok(())
}

#[tokio::test]
async fn malformed_requests_get_json_errors() -> TestResult {
	let ctx = TestContext::new()?;
	ctx.seed("x", "u1", Category::Other, 0).await?;

	let (status, body) = ctx.send(empty_request(Method::GET, "/listing/x?image=-1", None)).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].as_str().is_some_and(|e| !e.is_empty()), "{body}");

	let (status, body) = ctx.send(json_request(Method::POST, "/user/new", None, json!({ "name": "a" }))).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].as_str().is_some_and(|e| e.contains("email")), "{body}");

	let request = Request::builder().method(Method::POST).uri("/user/login").body(Body::from("{}")).unwrap();
	let (status, body) = ctx.send(request).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].is_string(), "{body}");

	let (token, _) = ctx.register("Ira", "ira@example.com").await?;
	let (status, body) = ctx
		.send(json_request(Method::POST, "/listing/x/boost/confirm", Some(&token), json!({ "payment": "pay_1" })))
		.await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].is_string(), "{body}");

	let (status, body) = ctx.send(empty_request(Method::POST, "/listing/new", Some(&token))).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert!(body["error"].is_string(), "{body}");
	Ok(())
}

#[tokio::test]
async fn feed_puts_boosted_first_and_filters() -> TestResult {
	let ctx = TestContext::new()?;
	ctx.seed("a", "u1", Category::Cars, 1).await?;
	ctx.seed("b", "u1", Category::Mobiles, 3).await?;
	ctx.seed("c", "u2", Category::Cars, 2).await?;
	ctx.state.listings.set_boost("b", Utc::now() + Duration::days(7)).await?;

	let (status, feed) = ctx.send(empty_request(Method::GET, "/listings", None)).await?;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(ids(&feed), ["b", "a", "c"]);
	assert_eq!(feed["listings"][0]["badge"], "FEATURED");
	assert!(feed["listings"][1].get("badge").is_none());

	let (_, cars) = ctx.send(empty_request(Method::GET, "/listings?category=Cars", None)).await?;
	assert_eq!(ids(&cars), ["a", "c"]);

	let (_, fashion) = ctx.send(empty_request(Method::GET, "/listings?category=Fashion", None)).await?;
	assert_eq!(fashion["empty"], true);
	assert_eq!(fashion["message"], "No products found");

	let (status, _) = ctx.send(empty_request(Method::GET, "/listings?category=Boats", None)).await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);
	Ok(())
}

#[tokio::test]
async fn keyword_search_tolerates_typos() -> TestResult {
	let ctx = TestContext::new()?;
	ctx.seed("a", "u1", Category::Cars, 1).await?;
	ctx.seed("b", "u1", Category::Mobiles, 2).await?;

	let (status, found) = ctx.send(empty_request(Method::GET, "/listings/search?q=listng", None)).await?;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(ids(&found), ["a", "b"]);

	let (_, found) = ctx.send(empty_request(Method::GET, "/listings/search?q=listing&category=Mobiles", None)).await?;
	assert_eq!(ids(&found), ["b"]);

	let (_, found) = ctx.send(empty_request(Method::GET, "/listings/search?q=tractor", None)).await?;
	assert_eq!(found["empty"], true);
	Ok(())
}

#[tokio::test]
async fn missing_listing_is_not_found() -> TestResult {
	let ctx = TestContext::new()?;
	let (status, body) = ctx.send(empty_request(Method::GET, "/listing/nope", None)).await?;
	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "Product not found.");
	Ok(())
}

#[tokio::test]
async fn only_the_owner_can_delete() -> TestResult {
	let ctx = TestContext::new()?;
	let (owner_token, owner) = ctx.register("Owner", "owner@example.com").await?;
	let (other_token, _) = ctx.register("Other", "other@example.com").await?;
	ctx.seed("mine", &owner, Category::Electronics, 0).await?;

	let (status, _) = ctx.send(empty_request(Method::DELETE, "/listing/mine", Some(&other_token))).await?;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (_, listed) = ctx.send(empty_request(Method::GET, "/user/listings", Some(&owner_token))).await?;
	assert_eq!(ids(&listed), ["mine"]);

	let (status, _) = ctx.send(empty_request(Method::DELETE, "/listing/mine", Some(&owner_token))).await?;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (_, feed) = ctx.send(empty_request(Method::GET, "/listings", None)).await?;
	assert_eq!(feed["count"], 0);
	let (_, listed) = ctx.send(empty_request(Method::GET, "/user/listings", Some(&owner_token))).await?;
	assert_eq!(listed["empty"], true);
	assert_eq!(listed["message"], "You haven't listed anything yet.");

	let (status, _) = ctx.send(empty_request(Method::DELETE, "/listing/mine", Some(&owner_token))).await?;
	assert_eq!(status, StatusCode::NOT_FOUND);
	Ok(())
}

#[tokio::test]
async fn boost_checkout_and_confirmation() -> TestResult {
	let ctx = TestContext::new()?;
	let (token, owner) = ctx.register("Sana", "sana@example.com").await?;
	let (other_token, _) = ctx.register("Other", "other@example.com").await?;
	ctx.seed("ad", &owner, Category::Bikes, 0).await?;

	let (status, checkout) = ctx.send(empty_request(Method::POST, "/listing/ad/boost", Some(&token))).await?;
	assert_eq!(status, StatusCode::OK, "{checkout}");
	assert_eq!(checkout["amount"], 4900);
	assert_eq!(checkout["currency"], "INR");
	assert_eq!(checkout["prefill"]["email"], "sana@example.com");

	let (status, _) = ctx.send(empty_request(Method::POST, "/listing/ad/boost", Some(&other_token))).await?;
	assert_eq!(status, StatusCode::FORBIDDEN);

	let (status, _) = ctx
		.send(json_request(Method::POST, "/listing/ad/boost/confirm", Some(&token), json!({ "payment_id": " " })))
		.await?;
	assert_eq!(status, StatusCode::BAD_REQUEST);

	let before = Utc::now();
	let (status, body) = ctx
		.send(json_request(Method::POST, "/listing/ad/boost/confirm", Some(&token), json!({ "payment_id": "pay_123" })))
		.await?;
	assert_eq!(status, StatusCode::OK, "{body}");
	assert_eq!(body["message"], "Success! Payment ID: pay_123. Your ad is now boosted for 7 days.");
	assert_eq!(body["listing"]["is_boosted"], true);

	let stored = ctx.state.listings.get("ad").await?.expect("listing still stored");
	let until = stored.boosted_until.expect("expiry recorded");
	assert!(until >= before + Duration::days(7));
	assert!(until <= Utc::now() + Duration::days(7));

	let (_, feed) = ctx.send(empty_request(Method::GET, "/listings", None)).await?;
	assert_eq!(feed["listings"][0]["badge"], "FEATURED");

	let (status, _) = ctx.send(empty_request(Method::POST, "/listing/ad/boost", Some(&token))).await?;
	assert_eq!(status, StatusCode::CONFLICT);
	Ok(())
}

#[tokio::test]
async fn profile_edit_keeps_email() -> TestResult {
	let ctx = TestContext::new()?;
	let (token, _) = ctx.register("Nila", "nila@example.com").await?;

	let body = format!("--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"name\"\r\n\r\nNila R\r\n--{BOUNDARY}--\r\n");
	let request = Request::builder()
		.method(Method::PUT)
		.uri("/user/profile")
		.header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
		.header(AUTHORIZATION, format!("Bearer {token}"))
		.body(Body::from(body))
		.unwrap();
	let (status, updated) = ctx.send(request).await?;
	assert_eq!(status, StatusCode::OK, "{updated}");
	assert_eq!(updated["message"], "Profile updated successfully!");
	assert_eq!(updated["profile"]["name"], "Nila R");
	assert_eq!(updated["profile"]["email"], "nila@example.com");
	assert!(updated["profile"]["profile_image"].is_null());
	Ok(())
}
