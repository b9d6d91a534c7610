//! Archive creation and modification

use crate::callbacks::{self, Session};
use crate::codec;
use crate::error::{Error, Result};
use crate::events::{ServiceNotification, WriteListener};
use crate::library::LibrarySource;
use crate::options::{self, WriteInputs, WriteMode, WriteOptions};
use infozip_sys::ZipLibrary;
use std::ffi::{c_char, c_int};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Adds, updates, freshens, moves or deletes archive members through the zip engine
///
/// Each operation takes a list of masks (`*` and `?` wildcards) and a listener that
/// receives the engine's notifications for the duration of that call.
///
/// ```no_run
/// use infozip::ZipWriter;
///
/// let writer = ZipWriter::new("test.zip")
///     .password("password")
///     .comment("This is just a test archive");
///
/// writer.add_files(&["*.jpg"], &mut ())?;
/// # Ok::<(), infozip::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ZipWriter {
    file_name: PathBuf,
    password: Option<String>,
    comment: Option<String>,
    root_folder: PathBuf,
    temporary_folder: PathBuf,
    options: WriteOptions,
    library: LibrarySource<ZipLibrary>,
}

struct WriteSession<'a> {
    password: Option<&'a str>,
    comment: Option<&'a str>,
    listener: &'a mut dyn WriteListener,
}

impl Session for WriteSession<'_> {
    fn print(&mut self, message: &str) {
        self.listener.on_print(message);
    }

    fn service(&mut self, notification: &ServiceNotification) {
        self.listener.on_service(notification);
    }

    fn password(&self) -> Option<&str> {
        self.password
    }

    fn comment(&self) -> Option<&str> {
        self.comment
    }
}

impl ZipWriter {
    /// Create a writer for the archive at `file_name`
    pub fn new<P: AsRef<Path>>(file_name: P) -> Self {
        ZipWriter {
            file_name: file_name.as_ref().to_path_buf(),
            password: None,
            comment: None,
            root_folder: PathBuf::new(),
            temporary_folder: PathBuf::new(),
            options: WriteOptions::default(),
            library: LibrarySource::Default,
        }
    }

    /// Encrypt added members with `password`; an empty password disables encryption
    pub fn password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the archive comment; an empty comment leaves the archive without one
    pub fn comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Directory member names are taken relative to
    pub fn root_folder<P: AsRef<Path>>(mut self, folder: P) -> Self {
        self.root_folder = folder.as_ref().to_path_buf();
        self
    }

    /// Directory for the engine's temporary files
    pub fn temporary_folder<P: AsRef<Path>>(mut self, folder: P) -> Self {
        self.temporary_folder = folder.as_ref().to_path_buf();
        self
    }

    /// Replace all engine options
    pub fn options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Load the zip engine from `path` instead of the default location
    pub fn library_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.library = LibrarySource::Path(path.as_ref().to_path_buf());
        self
    }

    /// Use an already loaded zip engine
    pub fn library(mut self, library: Arc<ZipLibrary>) -> Self {
        self.library = LibrarySource::Loaded(library);
        self
    }

    /// Archive path
    pub fn file_name(&self) -> &Path {
        &self.file_name
    }

    /// Current engine options
    pub fn write_options(&self) -> &WriteOptions {
        &self.options
    }

    /// Add files matching `masks`
    pub fn add_files<S: AsRef<str>>(&self, masks: &[S], listener: &mut dyn WriteListener) -> Result<()> {
        self.process(masks, WriteMode::Add, listener)
    }

    /// Add files matching a single mask
    pub fn add_file(&self, mask: &str, listener: &mut dyn WriteListener) -> Result<()> {
        self.add_files(&[mask], listener)
    }

    /// Add new files and replace members older than their files
    pub fn update_files<S: AsRef<str>>(&self, masks: &[S], listener: &mut dyn WriteListener) -> Result<()> {
        self.process(masks, WriteMode::Update, listener)
    }

    /// Update with a single mask
    pub fn update_file(&self, mask: &str, listener: &mut dyn WriteListener) -> Result<()> {
        self.update_files(&[mask], listener)
    }

    /// Replace existing members older than their files, adding nothing new
    pub fn freshen_files<S: AsRef<str>>(&self, masks: &[S], listener: &mut dyn WriteListener) -> Result<()> {
        self.process(masks, WriteMode::Freshen, listener)
    }

    /// Freshen with a single mask
    pub fn freshen_file(&self, mask: &str, listener: &mut dyn WriteListener) -> Result<()> {
        self.freshen_files(&[mask], listener)
    }

    /// Add files matching `masks`, then delete the originals
    pub fn move_files<S: AsRef<str>>(&self, masks: &[S], listener: &mut dyn WriteListener) -> Result<()> {
        self.process(masks, WriteMode::Move, listener)
    }

    /// Move with a single mask
    pub fn move_file(&self, mask: &str, listener: &mut dyn WriteListener) -> Result<()> {
        self.move_files(&[mask], listener)
    }

    /// Remove members matching `masks` from the archive
    pub fn delete_files<S: AsRef<str>>(&self, masks: &[S], listener: &mut dyn WriteListener) -> Result<()> {
        self.process(masks, WriteMode::Delete, listener)
    }

    /// Delete with a single mask
    pub fn delete_file(&self, mask: &str, listener: &mut dyn WriteListener) -> Result<()> {
        self.delete_files(&[mask], listener)
    }

    fn process<S: AsRef<str>>(
        &self,
        masks: &[S],
        mode: WriteMode,
        listener: &mut dyn WriteListener,
    ) -> Result<()> {
        if self.file_name.as_os_str().is_empty() {
            return Err(Error::InvalidArgument("archive name is empty".to_string()));
        }
        if masks.is_empty() {
            return Err(Error::InvalidArgument("no file masks given".to_string()));
        }

        let archive = options::path_to_cstring(&self.file_name)?;
        let masks = masks
            .iter()
            .map(|mask| codec::to_cstring(mask.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let names: Vec<*const c_char> = masks.iter().map(|mask| mask.as_ptr()).collect();
        let argc = c_int::try_from(names.len())
            .map_err(|_| Error::InvalidArgument("too many file masks".to_string()))?;

        let inputs = WriteInputs {
            password: self.password.as_deref(),
            comment: self.comment.as_deref(),
            root_folder: Some(&self.root_folder),
            temporary_folder: Some(&self.temporary_folder),
        };
        let mut zip_options = options::zip_options(&self.options, inputs, mode)?;

        let library = self.library.resolve()?;
        let functions = library.functions();

        let mut session = WriteSession {
            password: self.password.as_deref().filter(|p| !p.is_empty()),
            comment: self.comment.as_deref().filter(|c| !c.is_empty()),
            listener,
        };
        let _binding = callbacks::bind(&mut session);
        let mut user_functions = callbacks::zip_user_functions();

        // SAFETY: the callback table outlives every engine call below
        let initialized = unsafe { (functions.init)(&mut user_functions) };
        if initialized == 0 {
            return Err(Error::InitializationFailed);
        }

        // The return convention of ZpSetOptions differs between engine builds, so its
        // value is only logged.
        // SAFETY: the options block and the strings it points into live in `zip_options`
        let set = unsafe { (functions.set_options)(zip_options.as_mut_ptr()) };
        debug!(
            archive = %self.file_name.display(),
            mode = ?WriteMode::of(zip_options.raw()),
            masks = names.len(),
            set,
            "options submitted"
        );

        // SAFETY: `archive` and every pointer in `names` stay alive for the call
        let code = unsafe { (functions.archive)(argc, archive.as_ptr(), names.as_ptr()) };
        debug!(code, "archive operation finished");

        Error::from_zip_code(code)
    }
}
