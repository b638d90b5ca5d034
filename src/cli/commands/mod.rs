pub mod aplicativos;
pub mod correo;
pub mod notas;
pub mod sesion;
pub mod token;
