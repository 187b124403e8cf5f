//! libnss3 binding
//!
//! Symbols are resolved at runtime so the binary starts on systems without
//! NSS; only the first decrypt call reports the missing library.
//!
//! C signatures used (security/nss/lib):
//! - `SECStatus NSS_Init(const char *configdir)`
//! - `SECStatus NSS_Shutdown(void)`
//! - `SECItem *NSSBase64_DecodeBuffer(PLArenaPool *, SECItem *, const char *, unsigned int)`
//! - `SECStatus PK11SDR_Decrypt(SECItem *data, SECItem *result, void *cx)`
//! - `void SECITEM_ZfreeItem(SECItem *zap, PRBool freeit)`

use super::module::{ModuleLoader, SecStatus, SecurityModule};
use crate::error::DecryptError;
use libloading::Library;
use std::ffi::{c_char, c_int, c_uchar, c_uint, c_void, CString};
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};
use tracing::debug;

const SI_BUFFER: c_uint = 0;
const PR_TRUE: c_int = 1;
const PR_FALSE: c_int = 0;
const PW_NONE: c_uint = 0;

/// `SECItem` from seccomon.h
#[repr(C)]
pub struct SecItem {
    #[allow(dead_code)]
    kind: c_uint,
    data: *mut c_uchar,
    len: c_uint,
}

impl SecItem {
    fn empty() -> Self {
        Self {
            kind: SI_BUFFER,
            data: ptr::null_mut(),
            len: 0,
        }
    }

    fn as_slice(&self) -> &[u8] {
        if self.data.is_null() || self.len == 0 {
            return &[];
        }
        // SAFETY: NSS guarantees `data` points to `len` readable bytes for as
        // long as the item is not freed.
        unsafe { std::slice::from_raw_parts(self.data, self.len as usize) }
    }
}

/// `secuPWData` from nss_secutil.h, passed as the PK11 password context
#[repr(C)]
#[allow(dead_code)]
struct SecuPwData {
    source: c_uint,
    data: *mut c_char,
}

type NssInitFn = unsafe extern "C" fn(*const c_char) -> c_int;
type NssShutdownFn = unsafe extern "C" fn() -> c_int;
type Base64DecodeBufferFn =
    unsafe extern "C" fn(*mut c_void, *mut SecItem, *const c_char, c_uint) -> *mut SecItem;
type Pk11SdrDecryptFn = unsafe extern "C" fn(*mut SecItem, *mut SecItem, *mut c_void) -> c_int;
type SecItemZfreeItemFn = unsafe extern "C" fn(*mut SecItem, c_int);

/// Buffer owned by NSS
pub enum NssBuffer {
    /// Item allocated by `NSSBase64_DecodeBuffer`; the struct itself is freed too.
    Allocated(Option<NonNull<SecItem>>),
    /// Caller-owned item whose `data` was filled in by `PK11SDR_Decrypt`.
    Detached(SecItem),
}

/// Loaded libnss3 with its resolved entry points
pub struct Nss {
    init: NssInitFn,
    shutdown: NssShutdownFn,
    base64_decode_buffer: Base64DecodeBufferFn,
    sdr_decrypt: Pk11SdrDecryptFn,
    zfree_item: SecItemZfreeItemFn,
    _library: Library,
}

impl Nss {
    pub fn load(library_path: &Path) -> Result<Self, DecryptError> {
        let linking = |e: libloading::Error| DecryptError::Linking(e.to_string());

        // SAFETY: libnss3 runs no initialization code with preconditions on
        // load, and every symbol below is cast to its documented C signature.
        unsafe {
            let library = Library::new(library_path).map_err(linking)?;
            let init = *library.get::<NssInitFn>(b"NSS_Init\0").map_err(linking)?;
            let shutdown = *library.get::<NssShutdownFn>(b"NSS_Shutdown\0").map_err(linking)?;
            let base64_decode_buffer = *library
                .get::<Base64DecodeBufferFn>(b"NSSBase64_DecodeBuffer\0")
                .map_err(linking)?;
            let sdr_decrypt = *library
                .get::<Pk11SdrDecryptFn>(b"PK11SDR_Decrypt\0")
                .map_err(linking)?;
            let zfree_item = *library
                .get::<SecItemZfreeItemFn>(b"SECITEM_ZfreeItem\0")
                .map_err(linking)?;

            debug!("Linked NSS from {:?}", library_path);

            Ok(Self {
                init,
                shutdown,
                base64_decode_buffer,
                sdr_decrypt,
                zfree_item,
                _library: library,
            })
        }
    }

    fn item_ptr(buffer: &NssBuffer) -> *mut SecItem {
        match buffer {
            NssBuffer::Allocated(Some(item)) => item.as_ptr(),
            NssBuffer::Allocated(None) => ptr::null_mut(),
            NssBuffer::Detached(item) => item as *const SecItem as *mut SecItem,
        }
    }
}

impl SecurityModule for Nss {
    type Buffer = NssBuffer;

    fn initialize(&self, profile_path: &Path) -> SecStatus {
        let Ok(configdir) = CString::new(profile_path.as_os_str().as_encoded_bytes()) else {
            return SecStatus::Failure(-1);
        };
        // SAFETY: `configdir` is a valid NUL-terminated string for the call.
        SecStatus::from_raw(unsafe { (self.init)(configdir.as_ptr()) })
    }

    fn shutdown(&self) -> SecStatus {
        // SAFETY: only called by a session that initialized NSS.
        SecStatus::from_raw(unsafe { (self.shutdown)() })
    }

    fn base64_decode(&self, encoded: &[u8]) -> Option<NssBuffer> {
        let len = c_uint::try_from(encoded.len()).ok()?;
        // SAFETY: `encoded` is readable for `len` bytes; a null arena and
        // output item ask NSS to allocate the result item itself.
        let item = unsafe {
            (self.base64_decode_buffer)(
                ptr::null_mut(),
                ptr::null_mut(),
                encoded.as_ptr() as *const c_char,
                len,
            )
        };
        NonNull::new(item).map(|item| NssBuffer::Allocated(Some(item)))
    }

    fn decrypt(&self, decoded: &NssBuffer) -> Result<NssBuffer, SecStatus> {
        let mut result = SecItem::empty();
        let mut pwdata = SecuPwData {
            source: PW_NONE,
            data: ptr::null_mut(),
        };

        // SAFETY: `decoded` is a live item (PK11SDR_Decrypt only reads it),
        // `result` and `pwdata` outlive the call.
        let status = SecStatus::from_raw(unsafe {
            (self.sdr_decrypt)(
                Self::item_ptr(decoded),
                &mut result,
                &mut pwdata as *mut SecuPwData as *mut c_void,
            )
        });

        if status.is_success() {
            Ok(NssBuffer::Detached(result))
        } else {
            if !result.data.is_null() {
                // SAFETY: NSS allocated `result.data`; the item struct is ours.
                unsafe { (self.zfree_item)(&mut result, PR_FALSE) };
            }
            Err(status)
        }
    }

    fn bytes<'b>(&self, buffer: &'b NssBuffer) -> &'b [u8] {
        match buffer {
            // SAFETY: the item stays allocated until `free` clears the option.
            NssBuffer::Allocated(Some(item)) => unsafe { item.as_ref() }.as_slice(),
            NssBuffer::Allocated(None) => &[],
            NssBuffer::Detached(item) => item.as_slice(),
        }
    }

    fn free(&self, buffer: &mut NssBuffer) {
        match buffer {
            NssBuffer::Allocated(item) => {
                if let Some(item) = item.take() {
                    // SAFETY: item and contents were allocated by NSS.
                    unsafe { (self.zfree_item)(item.as_ptr(), PR_TRUE) };
                }
            }
            NssBuffer::Detached(item) => {
                if !item.data.is_null() {
                    // SAFETY: contents were allocated by NSS; zfree resets
                    // `data` and `len` so a second call is a no-op.
                    unsafe { (self.zfree_item)(item, PR_FALSE) };
                    item.data = ptr::null_mut();
                    item.len = 0;
                }
            }
        }
    }
}

/// Locates libnss3, either at an explicit path or by platform name.
#[derive(Debug, Clone, Default)]
pub struct NssLoader {
    library: Option<PathBuf>,
}

impl NssLoader {
    pub fn new(library: Option<PathBuf>) -> Self {
        Self { library }
    }

    /// Library that will be opened: the override, or `libnss3.so` / `libnss3.dylib` / `nss3.dll`.
    pub fn library_path(&self) -> PathBuf {
        self.library
            .clone()
            .unwrap_or_else(|| PathBuf::from(libloading::library_filename("nss3")))
    }
}

impl ModuleLoader for NssLoader {
    type Module = Nss;

    fn load(&self) -> Result<Nss, DecryptError> {
        Nss::load(&self.library_path())
    }
}
