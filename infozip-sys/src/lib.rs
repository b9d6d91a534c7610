//! Low-level FFI bindings to the Info-ZIP DLL interface (`zip32` / `unzip32`)
//!
//! The structures below mirror the native layouts field by field. Every entry point and
//! callback uses the platform "system" calling convention, which is `stdcall` on 32-bit
//! Windows and the C convention everywhere else.
//!
//! The engines are resolved at runtime through [`ZipLibrary`] and [`UnzipLibrary`], so a
//! missing engine surfaces as a load error instead of a link failure.

use std::ffi::{OsStr, OsString, c_char, c_int, c_short, c_uint};
use std::fmt;

pub use libloading::Error as LoadError;

/// Capacity of every textual callback payload.
pub const CALLBACK_STRING_SIZE: usize = 4096;

// Unzip status codes.
pub const PK_OK: c_int = 0;
pub const PK_WARN: c_int = 1;
pub const PK_ERR: c_int = 2;
pub const PK_BADERR: c_int = 3;
pub const PK_MEM: c_int = 4;
pub const PK_MEM2: c_int = 5;
pub const PK_MEM3: c_int = 6;
pub const PK_MEM4: c_int = 7;
pub const PK_MEM5: c_int = 8;
pub const PK_NOZIP: c_int = 9;
pub const PK_PARAM: c_int = 10;
pub const PK_FIND: c_int = 11;
pub const PK_DISK: c_int = 50;
pub const PK_EOF: c_int = 51;

// Zip status codes.
pub const ZE_MISS: c_int = -1;
pub const ZE_OK: c_int = 0;
pub const ZE_EOF: c_int = 2;
pub const ZE_FORM: c_int = 3;
pub const ZE_MEM: c_int = 4;
pub const ZE_LOGIC: c_int = 5;
pub const ZE_BIG: c_int = 6;
pub const ZE_NOTE: c_int = 7;
pub const ZE_TEST: c_int = 8;
pub const ZE_ABORT: c_int = 9;
pub const ZE_TEMP: c_int = 10;
pub const ZE_READ: c_int = 11;
pub const ZE_NONE: c_int = 12;
pub const ZE_NAME: c_int = 13;
pub const ZE_WRITE: c_int = 14;
pub const ZE_CREAT: c_int = 15;
pub const ZE_PARMS: c_int = 16;
pub const ZE_OPEN: c_int = 18;
pub const ZE_COMPERR: c_int = 19;
pub const ZE_ZIP64: c_int = 20;

// Replace callback replies.
pub const IDM_REPLACE_NO: c_int = 100;
pub const IDM_REPLACE_YES: c_int = 102;
pub const IDM_REPLACE_ALL: c_int = 103;
pub const IDM_REPLACE_NONE: c_int = 104;
pub const IDM_REPLACE_RENAME: c_int = 105;

/// Fixed-size, null-terminated message buffer handed to the text callbacks
#[repr(C)]
pub struct CallbackString {
    /// Raw message bytes; the text ends at the first zero byte, if any
    pub buffer: [u8; CALLBACK_STRING_SIZE],
}

impl Default for CallbackString {
    fn default() -> Self {
        CallbackString {
            buffer: [0; CALLBACK_STRING_SIZE],
        }
    }
}

impl fmt::Debug for CallbackString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self
            .buffer
            .iter()
            .position(|&b| b == 0)
            .unwrap_or(CALLBACK_STRING_SIZE);
        f.debug_struct("CallbackString")
            .field("text", &String::from_utf8_lossy(&self.buffer[..end]))
            .finish()
    }
}

/// Print callback: message text and its length
pub type PrintCallback = unsafe extern "system" fn(message: *mut CallbackString, size: c_uint) -> c_int;
/// Service callback: member name and its size. Also used for replace prompts and
/// application messages.
pub type ServiceCallback = unsafe extern "system" fn(message: *mut CallbackString, size: c_uint) -> c_int;
/// Password callback: destination buffer, its capacity, prompt and target name
pub type PasswordCallback = unsafe extern "system" fn(
    buffer: *mut c_char,
    size: c_int,
    prompt: *const c_char,
    name: *const c_char,
) -> c_int;
/// Comment callback: buffer to receive the archive comment
pub type CommentCallback = unsafe extern "system" fn(comment: *mut CallbackString) -> c_int;
/// Sound callback
pub type SoundCallback = unsafe extern "system" fn();

/// `ZPOPT`: options block for `ZpSetOptions`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct ZipOptions {
    /// US date `"12/31/98"` used by the date filters
    pub date: *const c_char,
    /// Root directory, or null
    pub root_dir: *const c_char,
    /// Temporary directory, or null
    pub temp_dir: *const c_char,
    /// 1 if a temporary directory is wanted
    pub temp: c_int,
    /// Include suffixes (not implemented by the engine)
    pub suffix: c_int,
    /// 1 if encryption is wanted
    pub encrypt: c_int,
    /// System and hidden files flag
    pub system: c_int,
    /// 1 if storing the volume label
    pub volume: c_int,
    /// 1 if excluding extra attributes
    pub extra: c_int,
    /// 1 if ignoring directory entries
    pub no_dir_entries: c_int,
    /// 1 if excluding files earlier than `date`
    pub exclude_date: c_int,
    /// 1 if including files earlier than `date`
    pub include_date: c_int,
    /// 1 if full messages are wanted
    pub verbose: c_int,
    /// 1 if minimum messages are wanted
    pub quiet: c_int,
    /// 1 if translating CR/LF to LF
    pub crlf_lf: c_int,
    /// 1 if translating LF to CR/LF
    pub lf_crlf: c_int,
    /// 1 if junking directory names
    pub junk_dir: c_int,
    /// 1 if appending to the zip file is allowed
    pub grow: c_int,
    /// 1 if making entries using DOS names
    pub force: c_int,
    /// 1 if deleting files once added or updated
    pub move_files: c_int,
    /// 1 if the named entries are to be deleted
    pub delete_entries: c_int,
    /// 1 if updating: add new files, replace only if newer
    pub update: c_int,
    /// 1 if freshening: replace existing entries only
    pub freshen: c_int,
    /// 1 if junking the SFX prefix
    pub junk_sfx: c_int,
    /// 1 if setting the zip file time to that of its latest member
    pub latest_time: c_int,
    /// 1 if putting a comment in the zip file
    pub comment: c_int,
    /// 1 if updating archive offsets for SFX files
    pub offsets: c_int,
    /// Privilege flag
    pub privilege: c_int,
    /// Read-only encryption flag
    pub encryption: c_int,
    /// 1 (`-r`) or 2 (`-R`) when recursing into subdirectories
    pub recurse: c_int,
    /// 1 to fix the archive, 2 to try harder
    pub repair: c_int,
    /// Compression level as an ASCII digit, `'0'` (store) to `'9'` (max)
    pub level: c_char,
}

impl Default for ZipOptions {
    fn default() -> Self {
        // SAFETY: every field is a raw pointer, an integer or a char; all-zero is a valid
        // (null / off) value for each of them.
        unsafe { std::mem::zeroed() }
    }
}

/// `ZIPUSERFUNCTIONS`: callback table passed to `ZpInit`
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipUserFunctions {
    /// Progress text
    pub print: Option<PrintCallback>,
    /// Archive comment request
    pub comment: Option<CommentCallback>,
    /// Password request
    pub password: Option<PasswordCallback>,
    /// Processed member notification
    pub service: Option<ServiceCallback>,
}

/// `DCL`: options block for `Wiz_SingleEntryUnzip`
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct UnzipOptions {
    /// Extract only newer or new files, without queries
    pub extract_only_newer: c_int,
    /// Convert spaces to underscores
    pub space_to_underscore: c_int,
    /// Prompt (through the replace callback) before overwriting
    pub prompt_to_overwrite: c_int,
    /// 0 = all messages, 1 = few messages, 2 = no messages
    pub quiet: c_int,
    /// Write to stdout
    pub write_to_stdout: c_int,
    /// Test the zip file
    pub test: c_int,
    /// Verbose listing
    pub verbose: c_int,
    /// Freshen existing files
    pub freshen: c_int,
    /// Display the zip file comment
    pub display_comment: c_int,
    /// 0 = junk paths, 1 = safe paths (skip `../`), 2 = allow directory traversal
    pub directory_mode: c_int,
    /// Always overwrite existing files
    pub overwrite_all: c_int,
    /// End-of-line translation
    pub translate_eol: c_int,
    /// Produce ZipInfo output
    pub zip_info: c_int,
    /// Match member names case-insensitively
    pub case_insensitive: c_int,
    /// 1 = restore ACLs in user mode, 2 = use privileges for restoring ACLs
    pub privilege: c_int,
    /// Zip file name
    pub zip_file_name: *const c_char,
    /// Directory to extract to; null for the current directory
    pub extract_dir: *const c_char,
}

impl Default for UnzipOptions {
    fn default() -> Self {
        // SAFETY: integers and raw pointers only; all-zero is valid for each field.
        unsafe { std::mem::zeroed() }
    }
}

/// `USERFUNCTIONS`: callback table and totals for the unzip entry points
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
pub struct UnzipUserFunctions {
    /// Progress text
    pub print: Option<PrintCallback>,
    /// Audible alert; may be null
    pub sound: Option<SoundCallback>,
    /// "File exists" prompt; returns one of the `IDM_REPLACE_*` codes
    pub replace: Option<ServiceCallback>,
    /// Password request
    pub password: Option<PasswordCallback>,
    /// Informational output such as listings
    pub application_message: Option<ServiceCallback>,
    /// Processed member notification; a non-zero return asks the engine to stop
    pub service: Option<ServiceCallback>,
    /// Filled in by the engine: compressed total size
    pub total_size_computed: c_int,
    /// Filled in by the engine: uncompressed total size
    pub total_size: c_int,
    /// Filled in by the engine: overall compression factor
    pub compression_factor: c_int,
    /// Filled in by the engine: number of members
    pub members_number: c_int,
    /// Filled in by the engine: archive has a comment
    pub comment_present: c_short,
}

/// `UzpBuffer`: engine-allocated block returned by `Wiz_UnzipToMemory`
#[repr(C)]
#[derive(Debug)]
pub struct UnzipMemoryBuffer {
    /// Number of valid bytes at `buffer`
    pub total_size: c_int,
    /// Engine-owned memory; release with `UzpFreeMemBuffer`
    pub buffer: *mut c_char,
}

impl Default for UnzipMemoryBuffer {
    fn default() -> Self {
        UnzipMemoryBuffer {
            total_size: 0,
            buffer: std::ptr::null_mut(),
        }
    }
}

/// `int ZpInit(LPZIPUSERFUNCTIONS)`; non-zero on success
pub type ZpInitFn = unsafe extern "system" fn(functions: *mut ZipUserFunctions) -> c_int;
/// `int ZpSetOptions(LPZPOPT)`
pub type ZpSetOptionsFn = unsafe extern "system" fn(options: *mut ZipOptions) -> c_int;
/// `int ZpArchive(int argc, char *archive, char **names)`
pub type ZpArchiveFn =
    unsafe extern "system" fn(argc: c_int, archive: *const c_char, names: *const *const c_char) -> c_int;
/// `int Wiz_SingleEntryUnzip(int, char **, int, char **, LPDCL, LPUSERFUNCTIONS)`
pub type WizSingleEntryUnzipFn = unsafe extern "system" fn(
    file_count: c_int,
    file_names: *const *const c_char,
    exclude_count: c_int,
    exclude_names: *const *const c_char,
    options: *mut UnzipOptions,
    functions: *mut UnzipUserFunctions,
) -> c_int;
/// `int Wiz_UnzipToMemory(char *zip, char *file, LPUSERFUNCTIONS, UzpBuffer *)`
pub type WizUnzipToMemoryFn = unsafe extern "system" fn(
    archive: *const c_char,
    member: *const c_char,
    functions: *mut UnzipUserFunctions,
    buffer: *mut UnzipMemoryBuffer,
) -> c_int;
/// `void UzpFreeMemBuffer(UzpBuffer *)`
pub type UzpFreeMemBufferFn = unsafe extern "system" fn(buffer: *mut UnzipMemoryBuffer);

/// Entry points of the zip (write) engine
#[derive(Debug, Clone, Copy)]
pub struct ZipFunctions {
    /// `ZpInit`
    pub init: ZpInitFn,
    /// `ZpSetOptions`
    pub set_options: ZpSetOptionsFn,
    /// `ZpArchive`
    pub archive: ZpArchiveFn,
}

/// Entry points of the unzip (extract) engine
#[derive(Debug, Clone, Copy)]
pub struct UnzipFunctions {
    /// `Wiz_SingleEntryUnzip`
    pub single_entry_unzip: WizSingleEntryUnzipFn,
    /// `Wiz_UnzipToMemory`
    pub unzip_to_memory: WizUnzipToMemoryFn,
    /// `UzpFreeMemBuffer`
    pub free_memory_buffer: UzpFreeMemBufferFn,
}

/// Resolve the library path: the environment override if set, else the platform file
/// name for `name` (`zip32.dll`, `libzip32.so`, ...).
pub fn library_path(variable: &str, name: &str) -> OsString {
    std::env::var_os(variable).unwrap_or_else(|| libloading::library_filename(name))
}

/// Loaded zip engine, or a function table supplied directly
#[derive(Debug)]
pub struct ZipLibrary {
    functions: ZipFunctions,
    _library: Option<libloading::Library>,
}

impl ZipLibrary {
    /// Base name of the engine library
    pub const DEFAULT_NAME: &'static str = "zip32";
    /// Environment variable overriding the engine path
    pub const PATH_VARIABLE: &'static str = "INFOZIP_ZIP_LIBRARY";

    /// Load the engine from `path` and resolve its entry points
    ///
    /// # Safety
    /// Loading runs the library's initialization routines; `path` must name an Info-ZIP
    /// zip engine exporting the expected signatures.
    pub unsafe fn open<P: AsRef<OsStr>>(path: P) -> Result<Self, LoadError> {
        unsafe {
            let library = libloading::Library::new(path.as_ref())?;
            let functions = ZipFunctions {
                init: *library.get::<ZpInitFn>(b"ZpInit\0")?,
                set_options: *library.get::<ZpSetOptionsFn>(b"ZpSetOptions\0")?,
                archive: *library.get::<ZpArchiveFn>(b"ZpArchive\0")?,
            };
            Ok(ZipLibrary {
                functions,
                _library: Some(library),
            })
        }
    }

    /// Path used when no explicit one is given
    pub fn default_path() -> OsString {
        library_path(Self::PATH_VARIABLE, Self::DEFAULT_NAME)
    }

    /// Wrap a function table that is not backed by a loaded library
    pub fn from_functions(functions: ZipFunctions) -> Self {
        ZipLibrary {
            functions,
            _library: None,
        }
    }

    /// Resolved entry points
    pub fn functions(&self) -> &ZipFunctions {
        &self.functions
    }
}

/// Loaded unzip engine, or a function table supplied directly
#[derive(Debug)]
pub struct UnzipLibrary {
    functions: UnzipFunctions,
    _library: Option<libloading::Library>,
}

impl UnzipLibrary {
    /// Base name of the engine library
    pub const DEFAULT_NAME: &'static str = "unzip32";
    /// Environment variable overriding the engine path
    pub const PATH_VARIABLE: &'static str = "INFOZIP_UNZIP_LIBRARY";

    /// Load the engine from `path` and resolve its entry points
    ///
    /// # Safety
    /// Loading runs the library's initialization routines; `path` must name an Info-ZIP
    /// unzip engine exporting the expected signatures.
    pub unsafe fn open<P: AsRef<OsStr>>(path: P) -> Result<Self, LoadError> {
        unsafe {
            let library = libloading::Library::new(path.as_ref())?;
            let functions = UnzipFunctions {
                single_entry_unzip: *library
                    .get::<WizSingleEntryUnzipFn>(b"Wiz_SingleEntryUnzip\0")?,
                unzip_to_memory: *library.get::<WizUnzipToMemoryFn>(b"Wiz_UnzipToMemory\0")?,
                free_memory_buffer: *library.get::<UzpFreeMemBufferFn>(b"UzpFreeMemBuffer\0")?,
            };
            Ok(UnzipLibrary {
                functions,
                _library: Some(library),
            })
        }
    }

    /// Path used when no explicit one is given
    pub fn default_path() -> OsString {
        library_path(Self::PATH_VARIABLE, Self::DEFAULT_NAME)
    }

    /// Wrap a function table that is not backed by a loaded library
    pub fn from_functions(functions: UnzipFunctions) -> Self {
        UnzipLibrary {
            functions,
            _library: None,
        }
    }

    /// Resolved entry points
    pub fn functions(&self) -> &UnzipFunctions {
        &self.functions
    }
}
