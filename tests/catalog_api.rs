//! End-to-end scenarios through the HTTP router over the in-memory store.

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use catalog_app::{build_app, RepositoryStore};
use catalog_kernel::settings::Settings;
use serde_json::{json, Value};
use tower::ServiceExt;

const AUTHORS: &[(&str, &str, &str)] = &[
    ("Роберт Джордан", "1948-10-17", "США"),
    ("Лев Толстой", "1828-09-09", "Россия"),
    ("Фёдор Достоевский", "1821-11-11", "Россия"),
    ("Михаил Булгаков", "1891-05-15", "Россия"),
    ("Антон Чехов", "1860-01-29", "Россия"),
    ("Джордж Оруэлл", "1903-06-25", "Великобритания"),
    ("Рэй Брэдбери", "1920-08-22", "США"),
    ("Брэндон Сандерсон", "1975-12-19", "США"),
];

/// Title, ISBN, indexes into `AUTHORS`.
const BOOKS: &[(&str, &str, &[usize])] = &[
    ("Колесо Времени. Око Мира", "9785170666126", &[0]),
    ("Колесо Времени. Великая охота", "978-5-17-079891-9", &[0]),
    ("Война и мир", "9785041168889", &[1]),
    ("Преступление и наказание", "9785893555479", &[2]),
    ("Мастер и Маргарита", "9785389025479", &[3]),
    ("Вишнёвый сад", "9785140022334", &[4]),
    ("1984", "9785306018119", &[5]),
    ("451 градус по Фаренгейту", "9785080065002", &[6]),
    ("Память света", "9785000000014", &[0, 7]),
    ("Идиот", "9785389012349", &[2]),
];

struct Api {
    router: Router,
}

impl Api {
    fn new() -> Self {
        let router = build_app(&RepositoryStore::memory(), &Settings::default()).unwrap();
        Self { router }
    }

    async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(encode_uri(uri));
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PUT, uri, Some(body)).await
    }

    async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    async fn create_author(&self, name: &str, birth_date: &str, country: &str) -> i64 {
        let (status, json) = self
            .post(
                "/api/v1/authors",
                json!({ "name": name, "birth_date": birth_date, "country": country }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{json}");
        json["body"]["id"].as_i64().unwrap()
    }

    async fn create_book(&self, title: &str, isbn: &str, author_ids: &[i64]) -> (StatusCode, Value) {
        self.post("/api/v1/books", book_payload(title, isbn, author_ids))
            .await
    }

    /// Loads the scenario dataset and returns the author ids in `AUTHORS` order.
    async fn seed(&self) -> Vec<i64> {
        let mut author_ids = Vec::new();
        for (name, birth_date, country) in AUTHORS {
            author_ids.push(self.create_author(name, birth_date, country).await);
        }
        for (title, isbn, authors) in BOOKS {
            let ids: Vec<i64> = authors.iter().map(|&i| author_ids[i]).collect();
            let (status, json) = self.create_book(title, isbn, &ids).await;
            assert_eq!(status, StatusCode::CREATED, "{json}");
        }
        author_ids
    }
}

/// Percent-encode everything outside printable ASCII so Cyrillic filters form a valid URI.
fn encode_uri(uri: &str) -> String {
    let mut encoded = String::with_capacity(uri.len());
    for byte in uri.bytes() {
        if byte.is_ascii_graphic() {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn book_payload(title: &str, isbn: &str, author_ids: &[i64]) -> Value {
    json!({
        "title": title,
        "isbn": isbn,
        "num_pages": 640,
        "publication_date": "2015-03-01",
        "authors": author_ids.iter().map(|id| json!({ "id": id })).collect::<Vec<_>>()
    })
}

fn titles(page: &Value) -> Vec<String> {
    page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|book| book["title"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn scenario_search_counts() {
    let api = Api::new();
    api.seed().await;

    for (query, expected) in [
        ("title=Колесо", 2),
        ("isbn=547", 2),
        ("author=Толстой", 1),
        ("", 10),
        ("title=Колесо&isbn=978&author=Роберт", 2),
        ("title=колесо&author=роберт", 2),
        ("author=Сандерсон", 1),
    ] {
        let (status, page) = api
            .get(&format!("/api/v1/books/search?{query}&size=20"))
            .await;
        assert_eq!(status, StatusCode::OK, "query {query}: {page}");
        assert_eq!(page["total"], expected, "query {query}");
        assert_eq!(page["items"].as_array().unwrap().len(), expected);
    }
}

#[tokio::test]
async fn search_results_contain_every_filter() {
    let api = Api::new();
    api.seed().await;

    let (_, page) = api.get("/api/v1/books/search?title=и&size=20").await;
    for book in page["items"].as_array().unwrap() {
        let title = book["title"].as_str().unwrap().to_lowercase();
        assert!(title.contains('и'), "{title}");
    }

    let (_, page) = api.get("/api/v1/books/search?author=джордан&size=20").await;
    for book in page["items"].as_array().unwrap() {
        let names: Vec<_> = book["authors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|a| a["name"].as_str().unwrap())
            .collect();
        assert!(names.contains(&"Роберт Джордан"), "{names:?}");
    }
}

#[tokio::test]
async fn search_is_sorted_and_paginated() {
    let api = Api::new();
    api.seed().await;

    let (_, first) = api.get("/api/v1/books/search?size=3").await;
    assert_eq!(
        titles(&first),
        vec!["1984", "451 градус по Фаренгейту", "Вишнёвый сад"]
    );
    assert_eq!(first["index"], 0);
    assert_eq!(first["size"], 3);
    assert_eq!(first["total"], 10);

    let (status, last) = api.get("/api/v1/books/search?page=3&size=3").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&last), vec!["Преступление и наказание"]);
    assert_eq!(last["total"], 10);

    let (status, beyond) = api.get("/api/v1/books/search?page=4&size=3").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(beyond["error"]["code"], "data_not_found");
}

#[tokio::test]
async fn search_without_matches_is_not_found() {
    let api = Api::new();
    api.seed().await;

    let (status, json) = api
        .get("/api/v1/books/search?title=NoSuchTitleExists")
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let message = json["error"]["message"].as_str().unwrap();
    assert!(message.contains("by parameters [NoSuchTitleExists]"), "{message}");
}

#[tokio::test]
async fn books_carry_their_authors() {
    let api = Api::new();
    api.seed().await;

    let (_, page) = api.get("/api/v1/books/search?title=Память").await;
    let authors: Vec<_> = page["items"][0]["authors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(authors, vec!["Брэндон Сандерсон", "Роберт Джордан"]);
}

#[tokio::test]
async fn create_and_fetch_book() {
    let api = Api::new();
    let tolstoy = api.create_author("Лев Толстой", "1828-09-09", "Россия").await;

    let (status, json) = api
        .create_book("Анна Каренина", "978-5-04-107927-7", &[tolstoy])
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let book = &json["body"];
    assert_eq!(book["isbn"], "9785041079277");
    assert_eq!(book["num_pages"], 640);
    assert_eq!(book["publication_date"], "2015-03-01");
    assert_eq!(book["authors"][0]["name"], "Лев Толстой");
    assert_eq!(book["authors"][0]["birth_date"], "1828-09-09");

    let id = book["id"].as_i64().unwrap();
    let (status, fetched) = api.get(&format!("/api/v1/books/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["body"], *book);

    let (status, by_author) = api
        .get(&format!("/api/v1/books/by-author/{tolstoy}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(titles(&by_author), vec!["Анна Каренина"]);
}

#[tokio::test]
async fn integrity_violations_are_bad_requests() {
    let api = Api::new();
    let tolstoy = api.create_author("Лев Толстой", "1828-09-09", "Россия").await;
    api.create_book("Анна Каренина", "9785041079277", &[tolstoy])
        .await;

    let (status, json) = api
        .create_book("Анна Каренина (копия)", "978-5041079277", &[tolstoy])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "integrity_violation");
    assert_eq!(
        json["error"]["message"],
        "Data has errors: One or more ISBN is incorrect. Check id's and other values"
    );

    let (status, json) = api
        .create_book("Воскресение", "9785041168889", &[tolstoy + 100])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "Data has errors: One or more authors is incorrect. Check id's and other values"
    );

    let (status, _) = api.get("/api/v1/books/search?title=Воскресение").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn invalid_payloads_are_rejected() {
    let api = Api::new();

    let (status, json) = api
        .create_book("Анна Каренина", "9785041079276", &[1])
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
    assert_eq!(
        json["error"]["message"],
        "Book not saved: isbn - invalid ISBN; "
    );
    assert_eq!(json["error"]["details"][0]["field"], "isbn");

    let (status, json) = api
        .post("/api/v1/authors", json!({ "id": 5, "name": "", "country": "Россия" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "Author not saved: id - must be null; name - must not be blank; birth_date - must not be null; "
    );

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/authors")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = api.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let (status, json) = api.get("/api/v1/authors?page=-1").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");

    let (status, _) = api.get("/api/v1/books/search?size=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api.get("/api/v1/books/search?page=abc").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_reconciles_authors_on_both_sides() {
    let api = Api::new();
    let ids = api.seed().await;
    let (jordan, sanderson, bradbury) = (ids[0], ids[7], ids[6]);

    let (_, page) = api.get("/api/v1/books/search?title=Память").await;
    let book_id = page["items"][0]["id"].as_i64().unwrap();

    let (status, json) = api
        .put(
            &format!("/api/v1/books/{book_id}"),
            json!({
                "title": "Память света (издание 2)",
                "isbn": "9785000000014",
                "num_pages": 900,
                "publication_date": "2016-01-01",
                "authors": [{ "id": sanderson }, { "id": bradbury, "name": "ignored" }]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    assert_eq!(json["body"]["title"], "Память света (издание 2)");
    assert_eq!(json["body"]["num_pages"], 900);
    let authors: Vec<_> = json["body"]["authors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["id"].as_i64().unwrap())
        .collect();
    assert_eq!(authors.len(), 2);
    assert!(authors.contains(&sanderson) && authors.contains(&bradbury));

    let (_, jordans) = api.get(&format!("/api/v1/books/by-author/{jordan}")).await;
    assert_eq!(
        titles(&jordans),
        vec!["Колесо Времени. Великая охота", "Колесо Времени. Око Мира"]
    );

    let (_, bradburys) = api.get(&format!("/api/v1/books/by-author/{bradbury}")).await;
    assert_eq!(
        titles(&bradburys),
        vec!["451 градус по Фаренгейту", "Память света (издание 2)"]
    );

    // Same author set again: nothing changes.
    let (status, again) = api
        .put(
            &format!("/api/v1/books/{book_id}"),
            book_payload("Память света (издание 2)", "9785000000014", &[bradbury, sanderson]),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(again["body"]["authors"], json["body"]["authors"]);
}

#[tokio::test]
async fn update_of_missing_entities_is_not_found() {
    let api = Api::new();

    let (status, json) = api
        .put("/api/v1/books/999", book_payload("1984", "9785306018119", &[]))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Book with id=999 not found");

    let (status, json) = api
        .put(
            "/api/v1/authors/77",
            json!({ "name": "Джордж Оруэлл", "birth_date": "1903-06-25", "country": "Великобритания" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Author with id=77 not found");
}

#[tokio::test]
async fn deletes_are_idempotent() {
    let api = Api::new();
    let ids = api.seed().await;

    let (_, page) = api.get("/api/v1/books/search?title=1984").await;
    let book_id = page["items"][0]["id"].as_i64().unwrap();

    for _ in 0..2 {
        let (status, json) = api.delete(&format!("/api/v1/books/{book_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "message": "Book was deleted or not exists" }));
    }
    let (status, _) = api.get(&format!("/api/v1/books/{book_id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let (status, json) = api.delete(&format!("/api/v1/authors/{}", ids[0])).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, json!({ "message": "Author was deleted or not exists" }));
    }

    let (_, page) = api.get("/api/v1/books/search?title=Память").await;
    let authors = page["items"][0]["authors"].as_array().unwrap();
    assert_eq!(authors.len(), 1);
    assert_eq!(authors[0]["name"], "Брэндон Сандерсон");

    let (status, _) = api.get("/api/v1/books/search?author=Джордан").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn authors_are_listed_by_name() {
    let api = Api::new();

    let (status, json) = api.get("/api/v1/authors").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Data not found");

    api.seed().await;
    let (status, page) = api.get("/api/v1/authors?size=3").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = page["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| a["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Антон Чехов", "Брэндон Сандерсон", "Джордж Оруэлл"]);
    assert_eq!(page["total"], 8);
}

#[tokio::test]
async fn service_endpoints_respond() {
    let api = Api::new();

    for uri in ["/healthz", "/api/v1/authors/health", "/api/v1/books/health"] {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = api.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }

    let (status, doc) = api.get("/docs/openapi.json").await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/api/v1/books/search"]["get"].is_object());
    assert!(doc["paths"]["/api/v1/authors"]["post"].is_object());
    assert!(doc["components"]["schemas"]["BookPage"].is_object());
}
