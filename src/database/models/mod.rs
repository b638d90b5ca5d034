pub mod aplicativo;
pub mod nota;
