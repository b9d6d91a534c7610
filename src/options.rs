//! Archive and extraction options and their native encoding

use crate::codec;
use crate::error::{Error, Result};
use infozip_sys::{UnzipOptions, ZipOptions};
use std::ffi::{CString, c_char, c_int};
use std::path::Path;
use std::ptr;

/// Recursion into subdirectories when collecting files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Recurse {
    /// Do not recurse
    #[default]
    None,
    /// Recurse into subdirectories (`-r`)
    Subdirectories,
    /// Recurse starting at the current directory, matching masks at every level (`-R`)
    FromRoot,
}

/// Archive repair mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repair {
    /// Do not repair
    #[default]
    None,
    /// Fix the archive (`-F`)
    Fix,
    /// Try harder, for badly damaged or truncated archives (`-FF`)
    DeepFix,
}

/// Compression level, from store-only to maximum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Store only
    Level0,
    /// Fastest
    Level1,
    /// Fast
    Level2,
    /// Fast
    Level3,
    /// Fast
    Level4,
    /// Medium
    Level5,
    /// The engine's usual default
    Level6,
    /// Slower
    Level7,
    /// Slow
    Level8,
    /// Slowest, best compression
    #[default]
    Level9,
}

impl CompressionLevel {
    /// Level for a digit 0-9; anything else selects [`CompressionLevel::Level9`]
    pub fn from_digit(digit: u8) -> Self {
        match digit {
            0 => CompressionLevel::Level0,
            1 => CompressionLevel::Level1,
            2 => CompressionLevel::Level2,
            3 => CompressionLevel::Level3,
            4 => CompressionLevel::Level4,
            5 => CompressionLevel::Level5,
            6 => CompressionLevel::Level6,
            7 => CompressionLevel::Level7,
            8 => CompressionLevel::Level8,
            _ => CompressionLevel::Level9,
        }
    }

    /// Numeric level 0-9
    pub fn digit(self) -> u8 {
        match self {
            CompressionLevel::Level0 => 0,
            CompressionLevel::Level1 => 1,
            CompressionLevel::Level2 => 2,
            CompressionLevel::Level3 => 3,
            CompressionLevel::Level4 => 4,
            CompressionLevel::Level5 => 5,
            CompressionLevel::Level6 => 6,
            CompressionLevel::Level7 => 7,
            CompressionLevel::Level8 => 8,
            CompressionLevel::Level9 => 9,
        }
    }
}

/// Which write operation an options block is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Add files, replacing existing entries
    Add,
    /// Add new files and replace entries that are older
    Update,
    /// Replace existing entries that are older; add nothing new
    Freshen,
    /// Add files, then delete the originals
    Move,
    /// Remove matching entries from the archive
    Delete,
}

impl WriteMode {
    /// Mode encoded in a native options block, or `None` if more than one mode flag is set
    pub fn of(options: &ZipOptions) -> Option<WriteMode> {
        let flags = [
            (options.update, WriteMode::Update),
            (options.freshen, WriteMode::Freshen),
            (options.move_files, WriteMode::Move),
            (options.delete_entries, WriteMode::Delete),
        ];
        let mut set = flags.iter().filter(|(flag, _)| *flag != 0);
        match (set.next(), set.next()) {
            (None, _) => Some(WriteMode::Add),
            (Some((_, mode)), None) => Some(*mode),
            _ => None,
        }
    }
}

/// Settings for archive creation and modification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WriteOptions {
    /// Recursion into subdirectories
    pub recurse: Recurse,
    /// Repair mode
    pub repair: Repair,
    /// Compression level
    pub compression_level: CompressionLevel,
    /// System and hidden files flag
    pub ignore_system_files: bool,
    /// Store the volume label
    pub store_volume_label: bool,
    /// Exclude extra file attributes
    pub exclude_extra_attributes: bool,
    /// Do not create entries for directories
    pub ignore_directory_entries: bool,
    /// Report oddities in the zip file structure
    pub verbose: bool,
    /// Suppress informational messages and comment prompts
    pub quiet: bool,
    /// Append to an existing zip file
    pub grow_archive: bool,
    /// Set the zip file time to that of its latest member
    pub latest_time: bool,
    /// Use security privileges, if granted, to capture all security information
    pub use_privileges: bool,
}

/// Settings for extraction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractOptions {
    /// Handling of directory components in member names
    pub path_mode: PathMode,
    /// What to do when a file already exists
    pub overwrite: OverwritePolicy,
    /// Match member names case-insensitively
    pub case_insensitive: bool,
    /// Restoring of ACLs
    pub privileges: PrivilegeMode,
    /// Amount of engine output
    pub quiet: QuietLevel,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        ExtractOptions {
            path_mode: PathMode::Safe,
            overwrite: OverwritePolicy::Prompt,
            case_insensitive: true,
            privileges: PrivilegeMode::None,
            quiet: QuietLevel::All,
        }
    }
}

/// Directory handling during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PathMode {
    /// Drop directory components from member names
    JunkPaths,
    /// Recreate directories, skipping `../` components
    #[default]
    Safe,
    /// Recreate directories, allowing traversal outside the target
    AllowTraversal,
}

/// Existing-file policy during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    /// Ask through [`ExtractListener::on_file_replace`](crate::ExtractListener::on_file_replace)
    #[default]
    Prompt,
    /// Overwrite without asking
    Always,
    /// Keep existing files
    Never,
}

/// ACL restoring during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrivilegeMode {
    /// Do not restore ACLs
    #[default]
    None,
    /// Restore ACLs in user mode
    RestoreAcl,
    /// Use privileges to restore ACLs
    UsePrivileges,
}

/// Amount of engine output during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuietLevel {
    /// All messages
    #[default]
    All,
    /// Few messages
    Few,
    /// No messages
    Silent,
}

/// `ZPOPT` block together with the strings it points into
#[derive(Debug)]
pub(crate) struct NativeZipOptions {
    raw: ZipOptions,
    _root_dir: Option<CString>,
    _temp_dir: Option<CString>,
}

impl NativeZipOptions {
    pub(crate) fn raw(&self) -> &ZipOptions {
        &self.raw
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut ZipOptions {
        &mut self.raw
    }
}

/// `DCL` block together with the strings it points into
#[derive(Debug)]
pub(crate) struct NativeUnzipOptions {
    raw: UnzipOptions,
    _zip_file_name: CString,
    _extract_dir: Option<CString>,
}

impl NativeUnzipOptions {
    pub(crate) fn raw(&self) -> &UnzipOptions {
        &self.raw
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut UnzipOptions {
        &mut self.raw
    }
}

/// Strings the write options depend on
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct WriteInputs<'a> {
    pub password: Option<&'a str>,
    pub comment: Option<&'a str>,
    pub root_folder: Option<&'a Path>,
    pub temporary_folder: Option<&'a Path>,
}

fn flag(value: bool) -> c_int {
    c_int::from(value)
}

fn recurse_code(recurse: Recurse) -> c_int {
    match recurse {
        Recurse::None => 0,
        Recurse::Subdirectories => 1,
        Recurse::FromRoot => 2,
    }
}

fn repair_code(repair: Repair) -> c_int {
    match repair {
        Repair::None => 0,
        Repair::Fix => 1,
        Repair::DeepFix => 2,
    }
}

fn level_code(level: CompressionLevel) -> c_char {
    (b'0' + level.digit()) as c_char
}

fn path_mode_code(mode: PathMode) -> c_int {
    match mode {
        PathMode::JunkPaths => 0,
        PathMode::Safe => 1,
        PathMode::AllowTraversal => 2,
    }
}

fn privilege_code(mode: PrivilegeMode) -> c_int {
    match mode {
        PrivilegeMode::None => 0,
        PrivilegeMode::RestoreAcl => 1,
        PrivilegeMode::UsePrivileges => 2,
    }
}

fn quiet_code(level: QuietLevel) -> c_int {
    match level {
        QuietLevel::All => 0,
        QuietLevel::Few => 1,
        QuietLevel::Silent => 2,
    }
}

fn non_empty(text: Option<&str>) -> bool {
    text.is_some_and(|t| !t.is_empty())
}

/// Convert a path for the engine; empty paths become `None` and are passed as null
pub(crate) fn optional_path(path: Option<&Path>) -> Result<Option<CString>> {
    match path {
        Some(p) if !p.as_os_str().is_empty() => path_to_cstring(p).map(Some),
        _ => Ok(None),
    }
}

/// Convert a path to the engine's single-byte encoding
pub(crate) fn path_to_cstring(path: &Path) -> Result<CString> {
    let path_str = path
        .to_str()
        .ok_or_else(|| Error::InvalidArgument("Path contains invalid UTF-8".to_string()))?;
    codec::to_cstring(path_str)
}

fn as_ptr(value: &Option<CString>) -> *const c_char {
    value.as_ref().map_or(ptr::null(), |s| s.as_ptr())
}

/// Build the `ZPOPT` block for `mode`
///
/// The base block is the "add" operation; every other mode sets exactly one extra flag.
pub(crate) fn zip_options(
    options: &WriteOptions,
    inputs: WriteInputs<'_>,
    mode: WriteMode,
) -> Result<NativeZipOptions> {
    let mut native = base_zip_options(options, inputs)?;
    match mode {
        WriteMode::Add => {}
        WriteMode::Update => native.raw.update = 1,
        WriteMode::Freshen => native.raw.freshen = 1,
        WriteMode::Move => native.raw.move_files = 1,
        WriteMode::Delete => native.raw.delete_entries = 1,
    }
    Ok(native)
}

fn base_zip_options(options: &WriteOptions, inputs: WriteInputs<'_>) -> Result<NativeZipOptions> {
    let root_dir = optional_path(inputs.root_folder)?;
    let temp_dir = optional_path(inputs.temporary_folder)?;

    let raw = ZipOptions {
        date: c"".as_ptr(),
        root_dir: as_ptr(&root_dir),
        temp_dir: as_ptr(&temp_dir),
        temp: flag(temp_dir.is_some()),
        encrypt: flag(non_empty(inputs.password)),
        system: flag(options.ignore_system_files),
        volume: flag(options.store_volume_label),
        extra: flag(options.exclude_extra_attributes),
        no_dir_entries: flag(options.ignore_directory_entries),
        verbose: flag(options.verbose),
        quiet: flag(options.quiet),
        grow: flag(options.grow_archive),
        latest_time: flag(options.latest_time),
        comment: flag(non_empty(inputs.comment)),
        privilege: flag(options.use_privileges),
        recurse: recurse_code(options.recurse),
        repair: repair_code(options.repair),
        level: level_code(options.compression_level),
        // No line-ending translation, date filtering, name junking or SFX handling
        ..ZipOptions::default()
    };

    Ok(NativeZipOptions {
        raw,
        _root_dir: root_dir,
        _temp_dir: temp_dir,
    })
}

/// Build the `DCL` block for an extraction from `archive` into `output_folder`
pub(crate) fn unzip_options(
    options: &ExtractOptions,
    archive: &Path,
    output_folder: Option<&Path>,
) -> Result<NativeUnzipOptions> {
    let zip_file_name = path_to_cstring(archive)?;
    let extract_dir = optional_path(output_folder)?;

    let (prompt_to_overwrite, overwrite_all) = match options.overwrite {
        OverwritePolicy::Prompt => (1, 0),
        OverwritePolicy::Always => (0, 1),
        OverwritePolicy::Never => (0, 0),
    };

    let raw = UnzipOptions {
        prompt_to_overwrite,
        overwrite_all,
        quiet: quiet_code(options.quiet),
        directory_mode: path_mode_code(options.path_mode),
        case_insensitive: flag(options.case_insensitive),
        privilege: privilege_code(options.privileges),
        zip_file_name: zip_file_name.as_ptr(),
        extract_dir: as_ptr(&extract_dir),
        ..UnzipOptions::default()
    };

    Ok(NativeUnzipOptions {
        raw,
        _zip_file_name: zip_file_name,
        _extract_dir: extract_dir,
    })
}
