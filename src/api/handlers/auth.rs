use crate::api::{GoogleAuthIn, TokenResponse};
use crate::auth;
use crate::config::settings;
use crate::models::ROLE_PRESIDENTE_COMITE;
use crate::store;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde_json::json;

/// Unidad raíz a la que se liga el alta automática de presidentes.
const ROOT_UNIT_ID: i64 = 1;

/// POST /auth/google
/// Verifica el ID token, exige que el correo pertenezca a un comité
/// registrado y emite el token de acceso.
pub async fn google_login_handler(body: web::Json<GoogleAuthIn>) -> impl Responder {
    let cfg = settings();
    let claims = match auth::google::verify_id_token(&body.id_token, &cfg.google_client_id).await {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error verificando token de Google: {}", e);
            return HttpResponse::Unauthorized()
                .json(json!({"error": format!("Token de Google inválido: {}", e)}));
        }
    };
    let email = claims.email.clone().unwrap_or_default();

    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    let registrado = match store::committees::find_committee_by_contact_email(&conn, &email) {
        Ok(r) => r,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };
    if registrado.is_none() {
        return HttpResponse::Forbidden()
            .json(json!({"error": "Usuario no registrado. Contacta a tu coordinador."}));
    }

    let name = claims
        .name
        .clone()
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or("").to_string());

    let user = match store::users::find_user_by_email(&conn, &email) {
        Ok(Some(u)) => u,
        Ok(None) => match store::users::insert_user(&conn, &email, &name, None, claims.picture.as_deref()) {
            Ok(u) => u,
            Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
        },
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    // Alta automática como presidencia de comité en la unidad raíz
    match store::users::find_assignment(&conn, user.id, ROOT_UNIT_ID, ROLE_PRESIDENTE_COMITE) {
        Ok(Some(_)) => {}
        Ok(None) => {
            if let Err(e) =
                store::users::insert_assignment(&conn, user.id, ROOT_UNIT_ID, ROLE_PRESIDENTE_COMITE)
            {
                eprintln!("no se pudo crear la asignación inicial: {}", e);
            }
        }
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    }

    let token = match auth::token::issue_token(user.id, &user.email, cfg.jwt_secret.as_bytes(), cfg.token_hours) {
        Ok(t) => t,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("token error: {}", e)})),
    };

    HttpResponse::Ok().json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
        user,
    })
}

/// GET /auth/me
pub async fn me_handler(req: HttpRequest) -> impl Responder {
    match auth::authenticate(&req) {
        Ok(user) => HttpResponse::Ok().json(user),
        Err(e) => HttpResponse::Unauthorized().json(json!({"error": e})),
    }
}

/// GET /auth/me/assignment
/// Rol efectivo (asignación más reciente) y comités ligados al correo.
pub async fn my_assignment_handler(req: HttpRequest) -> impl Responder {
    let user = match auth::authenticate(&req) {
        Ok(u) => u,
        Err(e) => return HttpResponse::Unauthorized().json(json!({"error": e})),
    };
    let conn = match store::open() {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    let role = store::users::latest_assignment_for_user(&conn, user.id)
        .ok()
        .flatten()
        .map(|ua| ua.role);

    let committees = match store::committees::list_committees_for_email(&conn, &user.email) {
        Ok(c) => c,
        Err(e) => return HttpResponse::InternalServerError().json(json!({"error": format!("store error: {}", e)})),
    };

    HttpResponse::Ok().json(json!({"role": role, "committees_owned": committees}))
}
