use base64::{engine::general_purpose::STANDARD, Engine as _};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::database::models::nota::is_blank;

/// Variables without which no SMTP session is attempted, in reporting order
pub const REQUIRED_SMTP_VARS: [&str; 4] = ["SMTP_HOST", "SMTP_PORT", "SMTP_USER", "SMTP_PASS"];

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("SMTP configuration incomplete: missing {}", .0.join(", "))]
    MissingConfig(Vec<&'static str>),
    #[error("SMTP configuration invalid: {0}")]
    InvalidConfig(String),
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },
    #[error("{0}")]
    Address(String),
    #[error("Failed to build message: {0}")]
    Build(String),
    #[error("Delivery failed: {0}")]
    Delivery(String),
    #[error("Verification failed: {0}")]
    Verification(String),
}

/// SMTP settings once every required variable is known to be present
#[derive(Clone)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pass: String,
    pub secure: bool,
    /// `EMAIL_FROM`, falling back to `SMTP_USER`
    pub from: String,
}

impl SmtpSettings {
    pub fn from_config(config: &SmtpConfig) -> Result<Self, MailError> {
        let values = [&config.host, &config.port, &config.user, &config.pass];
        let missing: Vec<&'static str> = REQUIRED_SMTP_VARS
            .iter()
            .zip(values)
            .filter(|(_, value)| value.as_deref().map_or(true, is_blank))
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(MailError::MissingConfig(missing));
        }

        // All four are present past this point
        let host = config.host.clone().unwrap_or_default();
        let user = config.user.clone().unwrap_or_default();
        let pass = config.pass.clone().unwrap_or_default();
        let raw_port = config.port.clone().unwrap_or_default();

        let port = raw_port
            .trim()
            .parse::<u16>()
            .map_err(|_| MailError::InvalidConfig(format!("SMTP_PORT '{}' is not a port number", raw_port)))?;

        let from = config.from.clone().unwrap_or_else(|| user.clone());

        Ok(Self {
            host,
            port,
            user,
            pass,
            secure: config.secure,
            from,
        })
    }

    /// A fresh transport; nothing is reused between calls
    fn transport(&self) -> Result<AsyncSmtpTransport<Tokio1Executor>, MailError> {
        let tls_parameters =
            TlsParameters::new(self.host.clone()).map_err(|e| MailError::InvalidConfig(e.to_string()))?;
        let tls = if self.secure {
            Tls::Wrapper(tls_parameters)
        } else {
            Tls::Opportunistic(tls_parameters)
        };

        Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.host.as_str())
            .port(self.port)
            .tls(tls)
            .credentials(Credentials::new(self.user.clone(), self.pass.clone()))
            .timeout(Some(SMTP_TIMEOUT))
            .build())
    }

    fn from_mailbox(&self) -> Result<Mailbox, MailError> {
        self.from
            .parse::<Mailbox>()
            .map_err(|e| MailError::InvalidConfig(format!("sender '{}' is not a valid address: {}", self.from, e)))
    }
}

/// Body of `POST /api/correos/enviar`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CorreoSaliente {
    #[serde(default)]
    pub para: String,
    #[serde(default)]
    pub cc: Option<String>,
    #[serde(default)]
    pub asunto: String,
    #[serde(default)]
    pub mensaje: String,
    /// JSON array, or a string holding one, describing attachments
    #[serde(default)]
    pub archivos_info: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnvioCorreo {
    #[serde(rename = "messageId")]
    pub message_id: String,
    pub adjuntos: usize,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct VerificacionSmtp {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub from: String,
}

/// Plain-text and HTML renditions of a message body
#[derive(Debug, Clone, PartialEq)]
pub struct CuerpoCorreo {
    pub text: String,
    pub html: String,
    pub is_html: bool,
}

impl CuerpoCorreo {
    /// A body holding both `<` and `>` is taken as HTML and the text part is
    /// the same body with tags removed. Anything else is plain text whose HTML
    /// part turns newlines into `<br>`.
    pub fn from_mensaje(mensaje: &str) -> Self {
        let is_html = mensaje.contains('<') && mensaje.contains('>');
        if is_html {
            Self {
                text: strip_tags(mensaje),
                html: mensaje.to_string(),
                is_html,
            }
        } else {
            Self {
                text: mensaje.to_string(),
                html: mensaje.replace('\n', "<br>"),
                is_html,
            }
        }
    }
}

/// Remove every `<...>` run. A `<` with no closing `>` after it is kept.
pub fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find('<') {
        match rest[start..].find('>') {
            Some(len) => {
                out.push_str(&rest[..start]);
                rest = &rest[start + len + 1..];
            }
            None => break,
        }
    }

    out.push_str(rest);
    out
}

/// One entry of `archivos_info`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ArchivoInfo {
    pub nombre: String,
    #[serde(default)]
    pub tipo: Option<String>,
    #[serde(default, alias = "contenidoBase64")]
    pub contenido_base64: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Adjunto {
    pub nombre: String,
    pub content_type: ContentType,
    pub contenido: Vec<u8>,
}

/// Read `archivos_info` leniently: malformed input is logged and ignored.
pub fn parse_archivos_info(value: &Value) -> Vec<ArchivoInfo> {
    let parsed;
    let value = match value {
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(v) => {
                parsed = v;
                &parsed
            }
            Err(e) => {
                warn!("Ignoring archivos_info: not valid JSON ({})", e);
                return Vec::new();
            }
        },
        other => other,
    };

    let Value::Array(items) = value else {
        warn!("Ignoring archivos_info: expected an array");
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match serde_json::from_value::<ArchivoInfo>(item.clone()) {
            Ok(info) => Some(info),
            Err(e) => {
                warn!("Skipping archivos_info entry: {}", e);
                None
            }
        })
        .collect()
}

/// Decode base64 attachment content. Entries without content are skipped.
pub fn decode_adjuntos(infos: Vec<ArchivoInfo>) -> Vec<Adjunto> {
    infos
        .into_iter()
        .filter_map(|info| {
            let Some(raw) = info.contenido_base64.as_deref().filter(|c| !is_blank(c)) else {
                warn!("Attachment '{}' has no content; skipped", info.nombre);
                return None;
            };

            // Accept data URLs as produced by FileReader.readAsDataURL
            let payload = match raw.split_once(";base64,") {
                Some((prefix, data)) if prefix.starts_with("data:") => data,
                _ => raw,
            };
            let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();

            let contenido = match STANDARD.decode(compact) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Attachment '{}' is not valid base64 ({}); skipped", info.nombre, e);
                    return None;
                }
            };

            let content_type = info
                .tipo
                .as_deref()
                .and_then(|t| ContentType::parse(t).ok())
                .or_else(|| ContentType::parse("application/octet-stream").ok())?;

            Some(Adjunto {
                nombre: info.nombre,
                content_type,
                contenido,
            })
        })
        .collect()
}

/// Parse a comma-separated address list. At least one address is required.
pub fn parse_mailboxes(list: &str, field: &str) -> Result<Vec<Mailbox>, MailError> {
    let mailboxes = list
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|addr| {
            addr.parse::<Mailbox>()
                .map_err(|e| MailError::Address(format!("Invalid address '{}' in '{}': {}", addr, field, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if mailboxes.is_empty() {
        return Err(MailError::Address(format!("'{}' has no valid address", field)));
    }
    Ok(mailboxes)
}

fn validate_correo(correo: &CorreoSaliente) -> Result<(), MailError> {
    let field_errors: HashMap<String, String> = [
        ("para", &correo.para),
        ("asunto", &correo.asunto),
        ("mensaje", &correo.mensaje),
    ]
    .into_iter()
    .filter(|(_, value)| is_blank(value))
    .map(|(field, _)| (field.to_string(), "This field is required".to_string()))
    .collect();

    if field_errors.is_empty() {
        Ok(())
    } else {
        Err(MailError::Validation {
            message: "Fields para, asunto and mensaje are required".to_string(),
            field_errors,
        })
    }
}

/// Assemble the MIME message: multipart/alternative body, wrapped in
/// multipart/mixed when there are attachments.
pub fn build_message(
    settings: &SmtpSettings,
    correo: &CorreoSaliente,
    adjuntos: Vec<Adjunto>,
) -> Result<(Message, String), MailError> {
    let from = settings.from_mailbox()?;
    let message_id = format!("<{}@{}>", Uuid::new_v4(), from.email.domain());

    let mut builder = Message::builder()
        .from(from)
        .subject(correo.asunto.trim())
        .message_id(Some(message_id.clone()));

    for mailbox in parse_mailboxes(&correo.para, "para")? {
        builder = builder.to(mailbox);
    }
    if let Some(cc) = correo.cc.as_deref().filter(|cc| !is_blank(cc)) {
        for mailbox in parse_mailboxes(cc, "cc")? {
            builder = builder.cc(mailbox);
        }
    }

    let cuerpo = CuerpoCorreo::from_mensaje(&correo.mensaje);
    let alternative = MultiPart::alternative_plain_html(cuerpo.text, cuerpo.html);

    let body = if adjuntos.is_empty() {
        alternative
    } else {
        adjuntos.into_iter().fold(MultiPart::mixed().multipart(alternative), |mixed, adjunto| {
            mixed.singlepart(Attachment::new(adjunto.nombre).body(adjunto.contenido, adjunto.content_type))
        })
    };

    let message = builder
        .multipart(body)
        .map_err(|e| MailError::Build(e.to_string()))?;
    Ok((message, message_id))
}

/// Stateless mail sender: every call opens its own SMTP session
pub struct MailService {
    config: SmtpConfig,
}

impl MailService {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }

    pub async fn send(&self, correo: CorreoSaliente) -> Result<EnvioCorreo, MailError> {
        validate_correo(&correo)?;
        let settings = SmtpSettings::from_config(&self.config)?;

        let adjuntos = correo
            .archivos_info
            .as_ref()
            .map(|value| decode_adjuntos(parse_archivos_info(value)))
            .unwrap_or_default();
        let adjunto_count = adjuntos.len();

        let (message, message_id) = build_message(&settings, &correo, adjuntos)?;
        let transport = settings.transport()?;

        info!(
            to = %correo.para,
            cc = correo.cc.as_deref().unwrap_or("-"),
            subject = %correo.asunto,
            attachments = adjunto_count,
            "Sending mail"
        );

        transport
            .send(message)
            .await
            .map_err(|e| MailError::Delivery(e.to_string()))?;

        info!("Mail {} delivered to relay {}", message_id, settings.host);
        Ok(EnvioCorreo {
            message_id,
            adjuntos: adjunto_count,
        })
    }

    /// Connect and authenticate against the relay without sending anything
    pub async fn verify(&self) -> Result<VerificacionSmtp, MailError> {
        let settings = SmtpSettings::from_config(&self.config)?;
        let transport = settings.transport()?;

        match transport.test_connection().await {
            Ok(true) => {
                info!("SMTP relay {}:{} verified", settings.host, settings.port);
                Ok(VerificacionSmtp {
                    host: settings.host,
                    port: settings.port,
                    user: settings.user,
                    from: settings.from,
                })
            }
            Ok(false) => Err(MailError::Verification(format!(
                "{}:{} did not accept the connection",
                settings.host, settings.port
            ))),
            Err(e) => Err(MailError::Verification(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn full_config() -> SmtpConfig {
        SmtpConfig {
            host: Some("smtp.example.com".into()),
            port: Some("587".into()),
            user: Some("despacho@example.com".into()),
            pass: Some("secret".into()),
            secure: false,
            from: None,
        }
    }

    fn correo(mensaje: &str) -> CorreoSaliente {
        CorreoSaliente {
            para: "cliente@example.com".into(),
            asunto: "Reporte".into(),
            mensaje: mensaje.into(),
            ..Default::default()
        }
    }

    #[test]
    fn plain_text_is_promoted_to_html() {
        let cuerpo = CuerpoCorreo::from_mensaje("Hola\nMundo\n");
        assert!(!cuerpo.is_html);
        assert_eq!(cuerpo.html, "Hola<br>Mundo<br>");
        assert_eq!(cuerpo.text, "Hola\nMundo\n");
    }

    #[test]
    fn html_gets_stripped_text_fallback() {
        let cuerpo = CuerpoCorreo::from_mensaje("<p>Hola <b>equipo</b></p>");
        assert!(cuerpo.is_html);
        assert_eq!(cuerpo.text, "Hola equipo");
        assert_eq!(cuerpo.html, "<p>Hola <b>equipo</b></p>");
    }

    #[test]
    fn lone_angle_bracket_is_plain_text() {
        let cuerpo = CuerpoCorreo::from_mensaje("a < b");
        assert!(!cuerpo.is_html);
        assert_eq!(cuerpo.text, "a < b");
    }

    #[test]
    fn strip_tags_matches_greedy_free_pattern() {
        assert_eq!(strip_tags("x <a href='y'>link</a> z"), "x link z");
        assert_eq!(strip_tags("1 > 0 and <b>ok</b>"), "1 > 0 and ok");
        assert_eq!(strip_tags("<b>open <i"), "open <i");
        assert_eq!(strip_tags("<<b>>"), ">");
    }

    #[test]
    fn missing_variables_are_named() {
        let config = SmtpConfig {
            host: None,
            pass: Some("  ".into()),
            ..full_config()
        };
        match SmtpSettings::from_config(&config) {
            Err(MailError::MissingConfig(missing)) => assert_eq!(missing, vec!["SMTP_HOST", "SMTP_PASS"]),
            other => panic!("expected missing config, got {:?}", other.map(|s| s.host)),
        }
    }

    #[test]
    fn everything_missing_lists_all_four() {
        match SmtpSettings::from_config(&SmtpConfig::default()) {
            Err(MailError::MissingConfig(missing)) => assert_eq!(missing, REQUIRED_SMTP_VARS.to_vec()),
            other => panic!("expected missing config, got {:?}", other.map(|s| s.host)),
        }
    }

    #[test]
    fn bad_port_is_invalid_config() {
        let config = SmtpConfig {
            port: Some("smtp".into()),
            ..full_config()
        };
        assert!(matches!(SmtpSettings::from_config(&config), Err(MailError::InvalidConfig(_))));
    }

    #[test]
    fn sender_falls_back_to_user() {
        let settings = SmtpSettings::from_config(&full_config()).unwrap();
        assert_eq!(settings.from, "despacho@example.com");

        let config = SmtpConfig {
            from: Some("SIGED <no-reply@example.com>".into()),
            ..full_config()
        };
        assert_eq!(SmtpSettings::from_config(&config).unwrap().from, "SIGED <no-reply@example.com>");
    }

    #[test]
    fn parses_address_lists() {
        let list = parse_mailboxes("a@example.com, Jefe <b@example.com>,", "para").unwrap();
        assert_eq!(list.len(), 2);
        assert!(parse_mailboxes(" , ", "cc").is_err());
        assert!(parse_mailboxes("not-an-address", "para").is_err());
    }

    #[test]
    fn archivos_info_accepts_string_or_array() {
        let as_string = json!(r#"[{"nombre": "a.txt", "contenido_base64": "aG9sYQ=="}]"#);
        assert_eq!(parse_archivos_info(&as_string).len(), 1);

        let as_array = json!([{"nombre": "b.pdf", "tipo": "application/pdf"}, {"size": 3}]);
        let infos = parse_archivos_info(&as_array);
        assert_eq!(infos.len(), 1);
        assert_eq!(infos[0].tipo.as_deref(), Some("application/pdf"));

        assert!(parse_archivos_info(&json!("{broken")).is_empty());
        assert!(parse_archivos_info(&json!({"nombre": "x"})).is_empty());
    }

    #[test]
    fn decodes_base64_and_data_urls() {
        let adjuntos = decode_adjuntos(vec![
            ArchivoInfo {
                nombre: "hola.txt".into(),
                tipo: Some("text/plain".into()),
                contenido_base64: Some("aG9s\nYQ==".into()),
            },
            ArchivoInfo {
                nombre: "data.bin".into(),
                tipo: None,
                contenido_base64: Some("data:application/octet-stream;base64,AQID".into()),
            },
            ArchivoInfo {
                nombre: "solo-metadatos.pdf".into(),
                tipo: Some("application/pdf".into()),
                contenido_base64: None,
            },
            ArchivoInfo {
                nombre: "roto.txt".into(),
                tipo: None,
                contenido_base64: Some("***".into()),
            },
        ]);

        assert_eq!(adjuntos.len(), 2);
        assert_eq!(adjuntos[0].contenido, b"hola");
        assert_eq!(adjuntos[1].contenido, vec![1, 2, 3]);
    }

    #[test]
    fn builds_message_with_cc_and_attachment() {
        let settings = SmtpSettings::from_config(&full_config()).unwrap();
        let mut correo = correo("Linea 1\nLinea 2");
        correo.cc = Some("copia@example.com".into());
        let adjuntos = decode_adjuntos(vec![ArchivoInfo {
            nombre: "hola.txt".into(),
            tipo: Some("text/plain".into()),
            contenido_base64: Some("aG9sYQ==".into()),
        }]);

        let (message, message_id) = build_message(&settings, &correo, adjuntos).unwrap();
        assert!(message_id.ends_with("@example.com>"));

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: Reporte"));
        assert!(raw.contains("Cc: copia@example.com"));
        assert!(raw.contains("multipart/mixed"));
        assert!(raw.contains("hola.txt"));
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        let correo = CorreoSaliente {
            para: "x@example.com".into(),
            ..Default::default()
        };
        match validate_correo(&correo) {
            Err(MailError::Validation { field_errors, .. }) => {
                assert!(field_errors.contains_key("asunto"));
                assert!(field_errors.contains_key("mensaje"));
                assert!(!field_errors.contains_key("para"));
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn send_without_host_fails_before_connecting() {
        let service = MailService::new(SmtpConfig {
            host: None,
            ..full_config()
        });
        match service.send(correo("hola")).await {
            Err(MailError::MissingConfig(missing)) => assert_eq!(missing, vec!["SMTP_HOST"]),
            other => panic!("expected missing config, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn verify_reports_missing_config_separately() {
        let service = MailService::new(SmtpConfig::default());
        assert!(matches!(service.verify().await, Err(MailError::MissingConfig(_))));
    }
}
