//! User-facing strings needed by the funnel logic, per locale.
//!
//! Only validation and status messages live here. Page copy belongs to the
//! front-end bundle.

use crate::locale::Locale;

/// A translatable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    ZipRequired,
    ZipInvalid,
    FirstNameRequired,
    LastNameRequired,
    PhoneRequired,
    PhoneLength { min: usize, max: usize },
    EmailRequired,
    EmailInvalid,
    InsuranceRequired,
    ConsentRequired,
    SubmitSuccess,
    SubmitError,
}

impl Message {
    /// Render the message in `locale`.
    pub fn text(&self, locale: Locale) -> String {
        use Locale::*;
        let s = match (self, locale) {
            (Self::ZipRequired, En) => "ZIP Code is required.",
            (Self::ZipRequired, Br) => "ZIP Code é obrigatório.",
            (Self::ZipRequired, Es) => "El codigo ZIP es obligatorio.",

            (Self::ZipInvalid, En) => "ZIP Code must be exactly 5 digits.",
            (Self::ZipInvalid, Br) => "ZIP Code deve ter exatamente 5 dígitos.",
            (Self::ZipInvalid, Es) => "El codigo ZIP debe tener exactamente 5 digitos.",

            (Self::FirstNameRequired, En) => "First name is required.",
            (Self::FirstNameRequired, Br) => "Nome é obrigatório.",
            (Self::FirstNameRequired, Es) => "El nombre es obligatorio.",

            (Self::LastNameRequired, En) => "Last name is required.",
            (Self::LastNameRequired, Br) => "Sobrenome é obrigatório.",
            (Self::LastNameRequired, Es) => "El apellido es obligatorio.",

            (Self::PhoneRequired, En) => "Phone number is required.",
            (Self::PhoneRequired, Br) => "Telefone é obrigatório.",
            (Self::PhoneRequired, Es) => "El telefono es obligatorio.",

            (Self::PhoneLength { min, max }, _) => {
                return phone_length_text(locale, &range_label(*min, *max));
            }

            (Self::EmailRequired, En) => "Email is required.",
            (Self::EmailRequired, Br) => "Email é obrigatório.",
            (Self::EmailRequired, Es) => "El correo electronico es obligatorio.",

            (Self::EmailInvalid, En) => "Please enter a valid email address.",
            (Self::EmailInvalid, Br) => "Digite um email válido.",
            (Self::EmailInvalid, Es) => "Ingresa un correo electronico valido.",

            (Self::InsuranceRequired, En) => "Select at least one insurance product.",
            (Self::InsuranceRequired, Br) => "Selecione pelo menos um seguro.",
            (Self::InsuranceRequired, Es) => "Selecciona al menos un seguro.",

            (Self::ConsentRequired, En) => "You must agree to receive messages to continue.",
            (Self::ConsentRequired, Br) => {
                "Você deve concordar em receber mensagens para continuar."
            }
            (Self::ConsentRequired, Es) => "Debe aceptar recibir mensajes para continuar.",

            (Self::SubmitSuccess, En) => "We will contact you soon.",
            (Self::SubmitSuccess, Br) => "Entraremos em contato em breve.",
            (Self::SubmitSuccess, Es) => "Nos pondremos en contacto pronto.",

            (Self::SubmitError, En) => "Failed to submit the form. Please try again.",
            (Self::SubmitError, Br) => "Não foi possível enviar o formulário. Tente novamente.",
            (Self::SubmitError, Es) => "No se pudo enviar el formulario. Intentalo nuevamente.",
        };
        s.to_string()
    }
}

/// `"10"` for a fixed length, `"10-11"` for a range.
pub fn range_label(min: usize, max: usize) -> String {
    if min == max {
        min.to_string()
    } else {
        format!("{min}-{max}")
    }
}

fn phone_length_text(locale: Locale, range: &str) -> String {
    match locale {
        Locale::En => format!("Phone number must have {range} digits for the selected country."),
        Locale::Br => format!("O telefone deve ter {range} dígitos para o país selecionado."),
        Locale::Es => format!("El telefono debe tener {range} digitos para el pais seleccionado."),
    }
}
