pub mod device_service;
pub mod encryption_service;

pub use device_service::{DeviceService, OperationError};
pub use encryption_service::{CredentialDecryptor, EncryptionError, EncryptionService};
