// src/common/i18n.rs

use std::collections::HashMap;

const FALLBACK_LANG: &str = "en";

/// Catálogo de mensagens de erro por idioma.
///
/// As chaves são os códigos estáveis usados pelo `AppError` e pelas mensagens
/// de validação (`required`, `invalid_email`...). Idioma desconhecido cai em
/// inglês; chave desconhecida devolve a própria chave.
#[derive(Debug, Clone)]
pub struct I18nStore {
    messages: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        Self::new()
    }
}

impl I18nStore {
    pub fn new() -> Self {
        let mut messages = HashMap::new();
        messages.insert("en", catalog(EN));
        messages.insert("es", catalog(ES));
        messages.insert("pt", catalog(PT));
        Self { messages }
    }

    pub fn translate<'a>(&'a self, lang: &str, key: &'a str) -> &'a str {
        self.messages
            .get(lang)
            .and_then(|m| m.get(key))
            .or_else(|| self.messages.get(FALLBACK_LANG).and_then(|m| m.get(key)))
            .copied()
            .unwrap_or(key)
    }
}

fn catalog(entries: &[(&'static str, &'static str)]) -> HashMap<&'static str, &'static str> {
    entries.iter().copied().collect()
}

const EN: &[(&str, &str)] = &[
    ("validation_failed", "One or more fields are invalid."),
    ("invalid_credentials", "Invalid username or password."),
    ("invalid_token", "Missing or invalid authentication token."),
    ("forbidden", "You are not allowed to perform this action."),
    ("user_not_found", "User not found."),
    ("username_taken", "This username is already in use."),
    ("not_found", "Resource not found."),
    ("conflict", "The resource already exists."),
    ("internal_error", "An unexpected error occurred."),
    ("required", "This field is required."),
    ("invalid_email", "Invalid e-mail address."),
    ("negative_amount", "The amount cannot be negative."),
    ("negative_duration", "The duration cannot be negative."),
    ("total_time_overflow", "The client's accumulated time is too large."),
    ("username_too_short", "The username must have at least 3 characters."),
    ("password_too_short", "The password must have at least 6 characters."),
];

const ES: &[(&str, &str)] = &[
    ("validation_failed", "Uno o más campos no son válidos."),
    ("invalid_credentials", "Credenciales inválidas."),
    ("invalid_token", "Token de autenticación ausente o inválido."),
    ("forbidden", "No tienes permiso para realizar esta acción."),
    ("user_not_found", "Usuario no encontrado."),
    ("username_taken", "Este nombre de usuario ya está en uso."),
    ("not_found", "Recurso no encontrado."),
    ("conflict", "El recurso ya existe."),
    ("internal_error", "Ha ocurrido un error inesperado."),
    ("required", "Este campo es obligatorio."),
    ("invalid_email", "Correo electrónico no válido."),
    ("negative_amount", "El importe no puede ser negativo."),
    ("negative_duration", "La duración no puede ser negativa."),
    ("total_time_overflow", "El tiempo acumulado del cliente es demasiado grande."),
    ("username_too_short", "El usuario debe tener al menos 3 caracteres."),
    ("password_too_short", "La contraseña debe tener al menos 6 caracteres."),
];

const PT: &[(&str, &str)] = &[
    ("validation_failed", "Um ou mais campos são inválidos."),
    ("invalid_credentials", "Usuário ou senha inválidos."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("forbidden", "Você não tem permissão para realizar esta ação."),
    ("user_not_found", "Usuário não encontrado."),
    ("username_taken", "Este usuário já está em uso."),
    ("not_found", "Recurso não encontrado."),
    ("conflict", "O recurso já existe."),
    ("internal_error", "Ocorreu um erro inesperado."),
    ("required", "Campo obrigatório."),
    ("invalid_email", "E-mail inválido."),
    ("negative_amount", "O valor não pode ser negativo."),
    ("negative_duration", "A duração não pode ser negativa."),
    ("total_time_overflow", "O tempo acumulado do cliente é grande demais."),
    ("username_too_short", "O usuário deve ter no mínimo 3 caracteres."),
    ("password_too_short", "A senha deve ter no mínimo 6 caracteres."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_english_then_to_key() {
        let store = I18nStore::new();
        assert_eq!(store.translate("es", "not_found"), "Recurso no encontrado.");
        assert_eq!(store.translate("fr", "not_found"), "Resource not found.");
        assert_eq!(store.translate("es", "no_such_key"), "no_such_key");
    }

    #[test]
    fn every_english_key_is_translated() {
        let store = I18nStore::new();
        for (key, english) in EN {
            for lang in ["es", "pt"] {
                assert_ne!(store.translate(lang, key), *english, "{lang} sem {key}");
            }
        }
    }
}
