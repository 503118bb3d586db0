use super::rules::Failure;
use super::SchemaKind;

/// Render the client-facing message for a failed field.
///
/// The login form has its own historical wording; record schemas share another.
pub fn render(kind: SchemaKind, label: &str, failure: Failure) -> String {
    if kind == SchemaKind::Login {
        if let Some(message) = login_message(label, failure) {
            return message;
        }
    }

    match failure {
        Failure::Required => format!("El campo {} es requerido", label),
        Failure::NotString => format!("El campo {} debe ser una cadena de caracteres", label),
        Failure::NotNumber => format!("El campo {} debe ser un número", label),
        Failure::NotInteger => format!("El campo {} debe ser un número entero", label),
        Failure::Empty => format!("El campo {} no puede estar vacío", label),
        Failure::TooShort(min) => format!("El campo {} debe tener al menos {} caracteres", label, min),
        Failure::TooLong(max) => format!("El campo {} no puede exceder los {} caracteres", label, max),
        Failure::NotAlphanumeric => format!("El campo {} solo puede contener letras y números", label),
        Failure::InvalidEmail => {
            format!("El campo {} debe tener un formato de correo electrónico válido", label)
        }
        Failure::NotAllowed => format!("El campo {} no está permitido", label),
    }
}

fn login_message(label: &str, failure: Failure) -> Option<String> {
    let message = match failure {
        Failure::Required => format!("Falta el campo {} en la solicitud", label),
        Failure::Empty => format!("El campo {} es requerido", label),
        Failure::InvalidEmail => "El email proporcionado no tiene un formato válido".to_string(),
        Failure::TooShort(min) => format!("La longitud mínima del {} es de {} caracteres", label, min),
        Failure::TooLong(max) => format!("La longitud máxima del {} es de {} caracteres", label, max),
        Failure::NotAlphanumeric => format!("El {} solo puede contener letras y números", label),
        _ => return None,
    };
    Some(message)
}
