//! Archive extraction to disk or memory

use crate::callbacks::{self, Session};
use crate::codec;
use crate::error::{Error, Result};
use crate::events::{ExtractListener, ServiceNotification};
use crate::library::LibrarySource;
use crate::options::{self, ExtractOptions};
use crate::status::{ReplaceDecision, UnzipStatus};
use infozip_sys::{UnzipLibrary, UnzipMemoryBuffer, UzpFreeMemBufferFn};
use std::ffi::{c_char, c_int};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::ptr;
use std::sync::Arc;
use tracing::debug;

/// Extracts members through the unzip engine
///
/// ```no_run
/// use infozip::ZipReader;
///
/// let reader = ZipReader::new("test.zip").password("password");
/// reader.extract_archive(&mut ())?;
///
/// let readme = reader.extract_to_memory("README.txt", &mut ())?;
/// # Ok::<(), infozip::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ZipReader {
    file_name: PathBuf,
    output_folder: PathBuf,
    password: Option<String>,
    use_system_sound: bool,
    options: ExtractOptions,
    library: LibrarySource<UnzipLibrary>,
}

struct ExtractSession<'a> {
    password: Option<&'a str>,
    use_system_sound: bool,
    listener: &'a mut dyn ExtractListener,
    bell: fn(),
}

fn system_bell() {
    // Nothing to report if stderr is closed
    let _ = std::io::stderr().write_all(b"\x07");
}

impl Session for ExtractSession<'_> {
    fn print(&mut self, message: &str) {
        self.listener.on_print(message);
    }

    fn service(&mut self, notification: &ServiceNotification) {
        self.listener.on_service(notification);
    }

    fn application_message(&mut self, notification: &ServiceNotification) {
        self.listener.on_application_message(notification);
    }

    fn sound(&mut self) {
        if !self.listener.on_sound() && self.use_system_sound {
            (self.bell)();
        }
    }

    fn file_replace(&mut self, prompt: &str, decision: &mut ReplaceDecision) {
        self.listener.on_file_replace(prompt, decision);
    }

    fn password(&self) -> Option<&str> {
        self.password
    }
}

/// Engine-allocated result of `Wiz_UnzipToMemory`, released exactly once on drop
struct NativeBuffer {
    raw: UnzipMemoryBuffer,
    free: UzpFreeMemBufferFn,
}

impl NativeBuffer {
    fn new(free: UzpFreeMemBufferFn) -> Self {
        NativeBuffer {
            raw: UnzipMemoryBuffer::default(),
            free,
        }
    }

    fn as_mut_ptr(&mut self) -> *mut UnzipMemoryBuffer {
        &mut self.raw
    }

    /// Copy the reported bytes into an owned vector; `None` when nothing was reported
    fn to_vec(&self) -> Result<Option<Vec<u8>>> {
        let len = usize::try_from(self.raw.total_size).unwrap_or(0);
        if len == 0 || self.raw.buffer.is_null() {
            return Ok(None);
        }

        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|_| Error::MemoryAllocation)?;
        // SAFETY: the engine reported `len` readable bytes at `buffer`
        let bytes = unsafe { std::slice::from_raw_parts(self.raw.buffer.cast::<u8>(), len) };
        data.extend_from_slice(bytes);
        Ok(Some(data))
    }
}

impl Drop for NativeBuffer {
    fn drop(&mut self) {
        // SAFETY: `raw` is the block filled by Wiz_UnzipToMemory (or still empty), and
        // drop runs once.
        unsafe { (self.free)(&mut self.raw) };
    }
}

impl ZipReader {
    /// Create a reader for the archive at `file_name`
    pub fn new<P: AsRef<Path>>(file_name: P) -> Self {
        ZipReader {
            file_name: file_name.as_ref().to_path_buf(),
            output_folder: PathBuf::new(),
            password: None,
            use_system_sound: false,
            options: ExtractOptions::default(),
            library: LibrarySource::Default,
        }
    }

    /// Directory to extract into; empty means the current directory
    pub fn output_folder<P: AsRef<Path>>(mut self, folder: P) -> Self {
        self.output_folder = folder.as_ref().to_path_buf();
        self
    }

    /// Password for encrypted members; empty means none
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Ring the terminal bell when the engine asks for a sound and the listener does
    /// not handle it
    pub fn use_system_sound(mut self, enabled: bool) -> Self {
        self.use_system_sound = enabled;
        self
    }

    /// Replace all extraction options
    pub fn options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the unzip engine from `path` instead of the default location
    pub fn library_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.library = LibrarySource::Path(path.as_ref().to_path_buf());
        self
    }

    /// Use an already loaded unzip engine
    pub fn library(mut self, library: Arc<UnzipLibrary>) -> Self {
        self.library = LibrarySource::Loaded(library);
        self
    }

    /// Archive path
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Current extraction options
    pub fn extract_options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Extract every member
    ///
    /// No mask is sent, so directory entries and names without an extension are
    /// extracted too, unlike a `*.*` mask.
    pub fn extract_archive(&self, listener: &mut dyn ExtractListener) -> Result<()> {
        self.extract(&[] as &[&str], listener)
    }

    /// Extract members matching `masks`; an empty list is rejected without calling the engine
    pub fn extract_files<S: AsRef<str>>(
        &self,
        masks: &[S],
        listener: &mut dyn ExtractListener,
    ) -> Result<()> {
        if masks.is_empty() {
            return Err(Error::InvalidArgument("no file masks given".to_string()));
        }
        self.extract(masks, listener)
    }

    /// Extract one member into memory
    ///
    /// Returns `Ok(None)` when the engine reports an empty result.
    pub fn extract_to_memory(
        &self,
        member: &str,
        listener: &mut dyn ExtractListener,
    ) -> Result<Option<Vec<u8>>> {
        self.check_file_name()?;
        if member.is_empty() {
            return Err(Error::InvalidArgument("member name is empty".to_string()));
        }

        let archive = options::path_to_cstring(&self.file_name)?;
        let member = codec::to_cstring(member)?;

        let library = self.library.resolve()?;
        let functions = library.functions();

        let mut session = self.session(listener);
        let _binding = callbacks::bind(&mut session);
        let mut user_functions = callbacks::unzip_user_functions();
        let mut buffer = NativeBuffer::new(functions.free_memory_buffer);

        // SAFETY: all pointers reference locals that outlive the call
        let code = unsafe {
            (functions.unzip_to_memory)(
                archive.as_ptr(),
                member.as_ptr(),
                &mut user_functions,
                buffer.as_mut_ptr(),
            )
        };
        let status = UnzipStatus::from_memory_extraction(code);
        debug!(code, ?status, size = buffer.raw.total_size, "memory extraction finished");

        Error::from_unzip_status(status)?;
        buffer.to_vec()
    }

    fn check_file_name(&self) -> Result<()> {
        if self.file_name.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("archive name is empty".to_string()));
        }
        Ok(())
    }

    fn session<'a>(&'a self, listener: &'a mut dyn ExtractListener) -> ExtractSession<'a> {
        ExtractSession {
            password: self.password.as_deref().filter(|p| !p.is_empty()),
            use_system_sound: self.use_system_sound,
            listener,
            bell: system_bell,
        }
    }

    fn extract<S: AsRef<str>>(&self, masks: &[S], listener: &mut dyn ExtractListener) -> Result<()> {
        self.check_file_name()?;

        let masks = masks
            .iter()
            .map(|mask| codec::to_cstring(mask.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let names: Vec<*const c_char> = masks.iter().map(|mask| mask.as_ptr()).collect();
        let count = c_int::try_from(names.len())
            .map_err(|_| Error::InvalidArgument("too many file masks".to_string()))?;
        // A zero count with a null list selects every member
        let names_ptr = if names.is_empty() {
            ptr::null()
        } else {
            names.as_ptr()
        };

        let mut unzip_options =
            options::unzip_options(&self.options, &self.file_name, Some(&self.output_folder))?;
        let library = self.library.resolve()?;
        let functions = library.functions();

        let mut session = self.session(listener);
        let _binding = callbacks::bind(&mut session);
        let mut user_functions = callbacks::unzip_user_functions();

        debug!(
            archive = %self.file_name.display(),
            masks = names.len(),
            directory_mode = unzip_options.raw().directory_mode,
            "extracting"
        );
        // SAFETY: options, names and callbacks all outlive the call
        let code = unsafe {
            (functions.single_entry_unzip)(
                count,
                names_ptr,
                0,
                ptr::null(),
                unzip_options.as_mut_ptr(),
                &mut user_functions,
            )
        };
        debug!(code, "extraction finished");

        Error::from_unzip_status(UnzipStatus::from_code(code))
    }
}
