// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    info(title = "Comercial API", description = "CRM de visitas comerciais"),
    paths(
        // --- Plataforma ---
        handlers::health::health,

        // --- Auth ---
        handlers::auth::login,

        // --- Usuários ---
        handlers::users::list_users,
        handlers::users::create_user,

        // --- Clientes ---
        handlers::clients::list_clients,
        handlers::clients::create_client,
        handlers::clients::get_client,
        handlers::clients::update_client,
        handlers::clients::get_client_folder,
        handlers::clients::add_contact,
        handlers::clients::add_expense,
        handlers::clients::add_document,

        // --- Visitas ---
        handlers::visits::list_visits,
        handlers::visits::create_visit,
        handlers::visits::record_visit,

        // --- Métricas ---
        handlers::metrics::get_metrics,
    ),
    components(
        schemas(
            handlers::health::HealthStatus,

            // --- AUTH ---
            models::auth::Role,
            models::auth::User,
            models::auth::LoginUserPayload,
            models::auth::CreateUserPayload,
            models::auth::AuthResponse,

            // --- CLIENTES ---
            models::client::GeoPoint,
            models::client::Client,
            models::client::Contact,
            models::client::CreateClientPayload,
            models::client::ClientPatch,
            models::client::NewContact,

            // --- ANEXOS ---
            models::attachment::DocumentKind,
            models::attachment::Expense,
            models::attachment::Document,
            models::attachment::NewExpense,
            models::attachment::NewDocument,

            // --- VISITAS ---
            models::visit::VisitStatus,
            models::visit::Visit,
            models::visit::NewVisit,
            models::visit::RecordVisitPayload,
            models::visit::RecordedVisit,

            // --- MÉTRICAS ---
            models::metrics::PipelineMetrics,
            models::metrics::ClientFolder,
        )
    ),
    tags(
        (name = "Plataforma", description = "Health check"),
        (name = "Auth", description = "Login e emissão de token"),
        (name = "Usuários", description = "Gestão de usuários (admin)"),
        (name = "Clientes", description = "Clientes, contatos e anexos"),
        (name = "Visitas", description = "Registro de visitas e reconciliação com clientes"),
        (name = "Métricas", description = "Indicadores do pipeline (admin)")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in ["/api/login", "/api/clients/{id}/folder", "/api/visits/record", "/api/metrics"] {
            assert!(doc.paths.paths.contains_key(path), "faltando {path}");
        }
        assert!(doc.components.unwrap().security_schemes.contains_key("api_jwt"));
    }
}
