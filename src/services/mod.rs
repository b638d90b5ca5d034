pub mod aplicativo_service;
pub mod mail_service;
pub mod nota_service;

pub use aplicativo_service::AplicativoService;
pub use mail_service::MailService;
pub use nota_service::NotaService;
