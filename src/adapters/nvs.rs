//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements both [`ConfigPort`] and [`StoragePort`] for the feeder.
//!
//! - `StoragePort`: a small byte-addressable EEPROM image kept as one NVS
//!   blob.  Bytes never written read back as `0xFF`, like erased EEPROM.
//!   Each write is read-modify-write of the whole image, committed once.
//! - `ConfigPort`: postcard-encoded [`FeederConfig`] overrides, validated
//!   on load and before every save.

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::FeederConfig;
use log::{info, warn};

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

const NAMESPACE: &str = "perchfeed";
const EEPROM_KEY: &str = "eeprom";
const CONFIG_KEY: &str = "tuning";

/// Size of the emulated EEPROM image.
pub const EEPROM_SIZE: usize = 64;

/// Value of a byte that has never been written.
pub const ERASED: u8 = 0xFF;

#[allow(dead_code)]
const MAX_BLOB_SIZE: usize = 512;

pub struct NvsAdapter {
    #[cfg(not(target_os = "espidf"))]
    store: std::cell::RefCell<HashMap<String, Vec<u8>>>,
}

impl NvsAdapter {
    /// Create a new NvsAdapter and initialise NVS flash.
    ///
    /// Returns `Err(ConfigError::IoError)` if flash initialisation fails
    /// unrecoverably. On first boot or after a version mismatch the NVS
    /// partition is erased and re-initialised automatically.
    pub fn new() -> Result<Self, ConfigError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
            // single main-task context before any concurrent NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("NVS: erasing and re-initialising flash partition");
                if unsafe { nvs_flash_erase() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
                if unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(ConfigError::IoError);
                }
            } else if ret != ESP_OK {
                return Err(ConfigError::IoError);
            }
            info!("NvsAdapter: ESP-IDF NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("NvsAdapter: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            store: std::cell::RefCell::new(HashMap::new()),
        })
    }

    // ── Blob primitives ───────────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, i32> {
        Ok(self.store.borrow().get(key).cloned())
    }

    #[cfg(not(target_os = "espidf"))]
    fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), i32> {
        self.store.borrow_mut().insert(key.to_string(), data.to_vec());
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn get_blob(&self, key: &str) -> Result<Option<Vec<u8>>, i32> {
        let key_buf = Self::c_name(key);
        Self::with_nvs_handle(false, |handle| {
            let mut size: usize = 0;

            // First call: get size
            let ret = unsafe {
                nvs_get_blob(handle, key_buf.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
            };
            if ret == ESP_ERR_NVS_NOT_FOUND {
                return Ok(None);
            }
            if ret != ESP_OK || size > MAX_BLOB_SIZE {
                return Err(ret);
            }

            let mut buf = vec![0u8; size];
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    buf.as_mut_ptr() as *mut _,
                    &mut size,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(Some(buf))
        })
        .or_else(|e| if e == ESP_ERR_NVS_NOT_FOUND { Ok(None) } else { Err(e) })
    }

    #[cfg(target_os = "espidf")]
    fn set_blob(&self, key: &str, data: &[u8]) -> Result<(), i32> {
        let key_buf = Self::c_name(key);
        Self::with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    key_buf.as_ptr() as *const _,
                    data.as_ptr() as *const _,
                    data.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
    }

    /// NUL-terminated copy of an NVS name (15 chars max).
    #[cfg(target_os = "espidf")]
    fn c_name(name: &str) -> [u8; 16] {
        let mut buf = [0u8; 16];
        let bytes = name.as_bytes();
        let len = bytes.len().min(15);
        buf[..len].copy_from_slice(&bytes[..len]);
        buf
    }

    /// Open the feeder namespace, execute a closure with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let ns_buf = Self::c_name(NAMESPACE);
        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }

    // ── EEPROM image ──────────────────────────────────────────

    /// Current image, erased bytes where nothing was ever stored.
    fn eeprom_image(&self) -> Result<[u8; EEPROM_SIZE], StorageError> {
        let mut image = [ERASED; EEPROM_SIZE];
        match self.get_blob(EEPROM_KEY) {
            Ok(Some(stored)) => {
                let len = stored.len().min(EEPROM_SIZE);
                image[..len].copy_from_slice(&stored[..len]);
                Ok(image)
            }
            Ok(None) => Ok(image),
            Err(e) => {
                warn!("NvsAdapter: EEPROM image read error {}", e);
                Err(StorageError::IoError)
            }
        }
    }

    fn check_range(addr: usize, len: usize) -> Result<(), StorageError> {
        match addr.checked_add(len) {
            Some(end) if end <= EEPROM_SIZE => Ok(()),
            _ => Err(StorageError::OutOfBounds),
        }
    }
}

impl StoragePort for NvsAdapter {
    fn read(&self, addr: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        Self::check_range(addr, buf.len())?;
        let image = self.eeprom_image()?;
        buf.copy_from_slice(&image[addr..addr + buf.len()]);
        Ok(())
    }

    fn write(&mut self, addr: usize, data: &[u8]) -> Result<(), StorageError> {
        Self::check_range(addr, data.len())?;
        let mut image = self.eeprom_image()?;
        image[addr..addr + data.len()].copy_from_slice(data);
        self.set_blob(EEPROM_KEY, &image).map_err(|e| {
            warn!("NvsAdapter: EEPROM write error {}", e);
            StorageError::IoError
        })
    }

    fn capacity(&self) -> usize {
        EEPROM_SIZE
    }
}

impl ConfigPort for NvsAdapter {
    fn load(&self) -> Result<FeederConfig, ConfigError> {
        match self.get_blob(CONFIG_KEY) {
            Ok(Some(bytes)) => {
                let cfg: FeederConfig =
                    postcard::from_bytes(&bytes).map_err(|_| ConfigError::Corrupted)?;
                cfg.validate()?;
                info!("NvsAdapter: loaded tuning ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Ok(None) => {
                info!("NvsAdapter: no stored tuning, using defaults");
                Ok(FeederConfig::default())
            }
            Err(e) => {
                warn!("NvsAdapter: tuning read error {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    fn save(&self, config: &FeederConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let bytes = postcard::to_allocvec(config).map_err(|_| ConfigError::IoError)?;
        self.set_blob(CONFIG_KEY, &bytes).map_err(|e| {
            warn!("NvsAdapter: tuning write error {}", e);
            ConfigError::IoError
        })?;
        info!("NvsAdapter: tuning saved ({} bytes)", bytes.len());
        Ok(())
    }
}
