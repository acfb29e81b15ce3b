//! Best-effort probing of the client rendering library.
//!
//! Once a context is current, the first loadable library from a candidate
//! list is opened and asked, through `glGetString`, which implementation is
//! actually serving the context. Nothing here is required for the bootstrap
//! to succeed.

use std::ffi::{c_char, CStr};

use libloading::{Library, Symbol};
use tracing::{debug, info};

use crate::error::DiagnosticsError;

const GL_VENDOR: u32 = 0x1F00;
const GL_RENDERER: u32 = 0x1F01;
const GL_VERSION: u32 = 0x1F02;

type GlGetString = unsafe extern "C" fn(name: u32) -> *const u8;

/// What the client library reported for the current context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientLibraryInfo {
    /// File name of the library that answered.
    pub library: String,
    pub vendor: String,
    pub renderer: String,
    pub version: String,
}

/// Library handle that is unloaded when it goes out of scope.
struct ScopedLibrary {
    name: String,
    library: Library,
}

impl ScopedLibrary {
    /// Opens the first candidate that loads.
    fn open_first(candidates: &[String]) -> Result<Self, DiagnosticsError> {
        let mut last_error = String::from("no candidates configured");
        for name in candidates {
            // SAFETY: the candidates are system GL dispatch libraries whose
            // initializers have no requirements on the caller.
            match unsafe { Library::new(name) } {
                Ok(library) => {
                    debug!("Loaded client library {}.", name);
                    return Ok(Self { name: name.clone(), library });
                }
                Err(e) => {
                    debug!("Client library {} not loadable: {}", name, e);
                    last_error = e.to_string();
                }
            }
        }
        Err(DiagnosticsError::LibraryUnavailable { tried: candidates.to_vec(), reason: last_error })
    }

    fn get_string_fn(&self) -> Result<Symbol<'_, GlGetString>, DiagnosticsError> {
        // SAFETY: `glGetString` has this signature in every GL ABI.
        unsafe { self.library.get::<GlGetString>(b"glGetString\0") }.map_err(|e| {
            DiagnosticsError::SymbolUnavailable {
                library: self.name.clone(),
                symbol: "glGetString",
                reason: e.to_string(),
            }
        })
    }
}

impl Drop for ScopedLibrary {
    fn drop(&mut self) {
        debug!("Unloading client library {}.", self.name);
    }
}

/// Queries vendor, renderer and version of the context current on this thread.
///
/// Must be called while a context is current, otherwise the library has
/// nothing to report and [`DiagnosticsError::QueryFailed`] is returned.
pub fn probe(candidates: &[String]) -> Result<ClientLibraryInfo, DiagnosticsError> {
    let library = ScopedLibrary::open_first(candidates)?;
    let get_string = library.get_string_fn()?;

    let query = |name: u32, property: &'static str| -> Result<String, DiagnosticsError> {
        // SAFETY: glGetString returns null or a static NUL-terminated string.
        let ptr = unsafe { get_string(name) };
        if ptr.is_null() {
            return Err(DiagnosticsError::QueryFailed { library: library.name.clone(), property });
        }
        // SAFETY: `ptr` was checked non-null above and points to a NUL-terminated
        // string owned by the library, which stays loaded until the copy below is made.
        let value = unsafe { CStr::from_ptr(ptr.cast::<c_char>()) };
        Ok(value.to_string_lossy().into_owned())
    };

    let info = ClientLibraryInfo {
        library: library.name.clone(),
        vendor: query(GL_VENDOR, "vendor")?,
        renderer: query(GL_RENDERER, "renderer")?,
        version: query(GL_VERSION, "version")?,
    };
    info!(
        "Client library {}: {} / {} / {}.",
        info.library, info.vendor, info.renderer, info.version
    );
    Ok(info)
}
