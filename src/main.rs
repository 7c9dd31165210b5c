use actix_web::{delete, get, post, put, web, App, HttpResponse, HttpServer, Responder};
use anyhow::Result;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

use cafe_barista::dialogue::minutes_until_expiry;
use cafe_barista::{
    Category, ContextStore, DialogueEngine, InMemoryContextStore, IntentRecognizer, ItemUpdate,
    JsonMenuCatalog, MenuCatalog, MenuItem, Menu, Settings,
};

struct AppState {
    engine: DialogueEngine,
    catalog: Arc<JsonMenuCatalog>,
    context_ttl: Duration,
}

#[derive(Deserialize)]
struct ChatRequest {
    message: String,
    user_id: Option<String>,
}

#[derive(Serialize)]
struct ChatResponse {
    response: String,
    intent: String,
    suggested_items: Vec<MenuItem>,
    menu_data: Option<Menu>,
}

#[derive(Deserialize)]
struct ResetRequest {
    user_id: String,
}

#[derive(Deserialize)]
struct NewItemRequest {
    category: String,
    name: String,
    price: u32,
    #[serde(default)]
    description: String,
}

#[derive(Deserialize)]
struct OrderInfoRequest {
    order_info: String,
}

#[get("/")]
async fn index() -> impl Responder {
    HttpResponse::Ok().json(json!({"message": "Café barista API is running", "status": "active"}))
}

#[get("/api/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({"status": "healthy"}))
}

#[get("/api/menu")]
async fn menu_endpoint(data: web::Data<AppState>) -> impl Responder {
    match data.catalog.menu_snapshot() {
        Ok(menu) => HttpResponse::Ok().json(json!({
            "success": true,
            "data": menu,
            "message": "Menu data retrieved successfully",
        })),
        Err(e) => {
            log::error!("Failed to get menu: {}", e);
            HttpResponse::InternalServerError()
                .json(json!({"success": false, "message": format!("Failed to get menu: {}", e)}))
        }
    }
}

#[get("/api/menu/{category}")]
async fn menu_category_endpoint(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    let name = path.into_inner();
    let category = match name.parse::<Category>() {
        Ok(category) => category,
        Err(e) => {
            return HttpResponse::NotFound().json(json!({"success": false, "message": e.to_string()}))
        }
    };
    match data.catalog.items_by_category(category) {
        Ok(items) => HttpResponse::Ok().json(json!({
            "success": true,
            "message": format!("Retrieved {} items from {}", items.len(), category),
            "category": category,
            "data": items,
        })),
        Err(e) => HttpResponse::InternalServerError()
            .json(json!({"success": false, "message": e.to_string()})),
    }
}

#[post("/api/chat")]
async fn chat_endpoint(req: web::Json<ChatRequest>, data: web::Data<AppState>) -> impl Responder {
    let req = req.into_inner();
    let user_id = req.user_id.unwrap_or_else(|| "default_user".to_string());
    let reply = data.engine.handle_message(&user_id, req.message.trim());
    HttpResponse::Ok().json(ChatResponse {
        response: reply.text,
        intent: reply.intent,
        suggested_items: reply.suggested_items,
        menu_data: reply.menu_snapshot,
    })
}

#[post("/api/chat/reset")]
async fn reset_endpoint(req: web::Json<ResetRequest>, data: web::Data<AppState>) -> impl Responder {
    let reply = data.engine.reset_conversation(&req.user_id);
    HttpResponse::Ok().json(ChatResponse {
        response: reply.text,
        intent: reply.intent,
        suggested_items: reply.suggested_items,
        menu_data: reply.menu_snapshot,
    })
}

#[get("/api/order/{user_id}")]
async fn order_status_endpoint(
    path: web::Path<String>,
    data: web::Data<AppState>,
) -> impl Responder {
    let user_id = path.into_inner();
    let ctx = match data.engine.current_context(&user_id) {
        Some(ctx) if !ctx.order.is_empty() => ctx,
        other => {
            let state = other.map(|c| c.state).unwrap_or_default();
            return HttpResponse::Ok().json(json!({
                "success": true,
                "has_order": false,
                "message": "No active order found",
                "state": state,
            }));
        }
    };
    let expires_in = minutes_until_expiry(ctx.last_activity, chrono::Local::now(), data.context_ttl);
    HttpResponse::Ok().json(json!({
        "success": true,
        "has_order": true,
        "order_details": {
            "items": ctx.order.lines(),
            "total_price": ctx.order.total_price(),
            "dining_option": ctx.order.dining_option,
            "state": ctx.state,
        },
        "expires_in_minutes": expires_in,
    }))
}

#[post("/api/admin/items")]
async fn add_item_endpoint(
    req: web::Json<NewItemRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    let outcome = match req.category.parse::<Category>() {
        Ok(category) => data
            .catalog
            .add_item(category, &req.name, req.price, &req.description),
        Err(e) => Err::<String, _>(e).into(),
    };
    HttpResponse::Ok().json(outcome)
}

#[put("/api/admin/items/{item_id}")]
async fn update_item_endpoint(
    path: web::Path<String>,
    req: web::Json<ItemUpdate>,
    data: web::Data<AppState>,
) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.update_item(&path.into_inner(), req.into_inner()))
}

#[delete("/api/admin/items/{item_id}")]
async fn delete_item_endpoint(path: web::Path<String>, data: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.delete_item(&path.into_inner()))
}

#[put("/api/admin/order-info")]
async fn order_info_endpoint(
    req: web::Json<OrderInfoRequest>,
    data: web::Data<AppState>,
) -> impl Responder {
    HttpResponse::Ok().json(data.catalog.update_ordering_info(&req.order_info))
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(health)
        .service(menu_endpoint)
        .service(menu_category_endpoint)
        .service(chat_endpoint)
        .service(reset_endpoint)
        .service(order_status_endpoint)
        .service(add_item_endpoint)
        .service(update_item_endpoint)
        .service(delete_item_endpoint)
        .service(order_info_endpoint);
}

fn build_state(settings: &Settings, catalog: Arc<JsonMenuCatalog>) -> Result<AppState> {
    let recognizer = match &settings.data.intents_file {
        Some(path) => {
            log::info!("Loading intent keywords from {}", path);
            IntentRecognizer::from_json_file(path)?
        }
        None => IntentRecognizer::default(),
    };
    let context_ttl = Duration::minutes(settings.conversation.expiry_minutes);
    let store: Arc<dyn ContextStore> = Arc::new(InMemoryContextStore::with_ttl(context_ttl));
    let engine = DialogueEngine::new(catalog.clone())
        .with_store(store)
        .with_recognizer(recognizer)
        .with_shop_name(settings.conversation.shop_name.clone())
        .with_order_id_prefix(settings.conversation.order_id_prefix.clone());
    Ok(AppState {
        engine,
        catalog,
        context_ttl,
    })
}

#[actix_web::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load("Config")?;
    let catalog = Arc::new(JsonMenuCatalog::open(&settings.data.menu_file));
    let state = build_state(&settings, catalog)?;
    let data = web::Data::new(state);

    let host = settings.server.host.clone();
    let port = settings.server.port;
    log::info!("Starting {} barista server at http://{}:{}", settings.conversation.shop_name, host, port);
    HttpServer::new(move || App::new().app_data(data.clone()).configure(routes))
        .bind((host, port))?
        .run()
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test;

    fn test_state() -> web::Data<AppState> {
        let mut menu = Menu::with_order_info("Pay at the counter.");
        menu.iced_coffee.push(
            MenuItem::new("I_1", "Iced Coffee", 18_000, "", Category::IcedCoffee).unwrap(),
        );
        let catalog = Arc::new(JsonMenuCatalog::from_menu(menu));
        web::Data::new(build_state(&Settings::default(), catalog).unwrap())
    }

    #[actix_web::test]
    async fn test_chat_flow_over_http() {
        let app = test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({"message": "order iced coffee", "user_id": "web-1"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["intent"], "order_info");

        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({"message": "2", "user_id": "web-1"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["intent"], "order_update");

        let req = test::TestRequest::get().uri("/api/order/web-1").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["has_order"], true);
        assert_eq!(body["order_details"]["total_price"], 36_000);
        assert_eq!(body["order_details"]["state"], "AWAITING_MORE_ITEMS");
    }

    #[actix_web::test]
    async fn test_chat_without_user_id_uses_default() {
        let app = test::init_service(App::new().app_data(test_state()).configure(routes)).await;
        let req = test::TestRequest::post()
            .uri("/api/chat")
            .set_json(json!({"message": "show me the menu"}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["intent"], "view_menu");
        assert!(body["menu_data"]["iced_coffee"].is_array());

        let req = test::TestRequest::get().uri("/api/order/default_user").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["has_order"], false);
        assert_eq!(body["state"], "GENERAL");
    }

    #[actix_web::test]
    async fn test_menu_category_lookup() {
        let app = test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = test::TestRequest::get().uri("/api/menu/iced_coffee").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["data"][0]["name"], "Iced Coffee");

        let req = test::TestRequest::get().uri("/api/menu/soup").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_admin_add_item_reports_outcome() {
        let app = test::init_service(App::new().app_data(test_state()).configure(routes)).await;

        let req = test::TestRequest::post()
            .uri("/api/admin/items")
            .set_json(json!({"category": "pastry", "name": "Bagel", "price": 12000}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], true);

        let req = test::TestRequest::post()
            .uri("/api/admin/items")
            .set_json(json!({"category": "soup", "name": "Ramen", "price": 30000}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["success"], false);
    }
}
