//! Native status code translation
//!
//! The zip and unzip engines use two overlapping integer domains. Each gets its own closed
//! enumeration; codes outside the documented tables land in `Unknown` so that every integer
//! maps to exactly one member.

use infozip_sys as sys;
use std::ffi::c_int;
use std::fmt;

/// Result of a zip (write) engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZipStatus {
    /// Success
    Ok,
    /// Missing item (internal to the engine)
    Miss,
    /// Unexpected end of zip file
    Eof,
    /// Zip file structure error
    Form,
    /// Out of memory
    Memory,
    /// Internal logic error
    Logic,
    /// Entry too large to split, read, or write
    TooBig,
    /// Invalid comment format
    Note,
    /// Zip test failed or out of memory
    Test,
    /// User interrupt or termination
    Abort,
    /// Error using a temporary file
    Temp,
    /// Read or seek error
    Read,
    /// Nothing to do
    Nothing,
    /// Missing or empty zip file
    Name,
    /// Error writing to a file
    Write,
    /// Could not open for writing
    Create,
    /// Bad command line
    Parameters,
    /// Could not open a specified file to read
    Open,
    /// Error in compilation options
    CompileOptions,
    /// Zip64 not supported
    Zip64,
    /// Code outside the documented table
    Unknown(i32),
}

impl ZipStatus {
    /// Map a native return code
    pub fn from_code(code: c_int) -> Self {
        match code {
            sys::ZE_OK => ZipStatus::Ok,
            sys::ZE_MISS => ZipStatus::Miss,
            sys::ZE_EOF => ZipStatus::Eof,
            sys::ZE_FORM => ZipStatus::Form,
            sys::ZE_MEM => ZipStatus::Memory,
            sys::ZE_LOGIC => ZipStatus::Logic,
            sys::ZE_BIG => ZipStatus::TooBig,
            sys::ZE_NOTE => ZipStatus::Note,
            sys::ZE_TEST => ZipStatus::Test,
            sys::ZE_ABORT => ZipStatus::Abort,
            sys::ZE_TEMP => ZipStatus::Temp,
            sys::ZE_READ => ZipStatus::Read,
            sys::ZE_NONE => ZipStatus::Nothing,
            sys::ZE_NAME => ZipStatus::Name,
            sys::ZE_WRITE => ZipStatus::Write,
            sys::ZE_CREAT => ZipStatus::Create,
            sys::ZE_PARMS => ZipStatus::Parameters,
            sys::ZE_OPEN => ZipStatus::Open,
            sys::ZE_COMPERR => ZipStatus::CompileOptions,
            sys::ZE_ZIP64 => ZipStatus::Zip64,
            other => ZipStatus::Unknown(other),
        }
    }

    /// The native code for this status
    pub fn code(self) -> c_int {
        match self {
            ZipStatus::Ok => sys::ZE_OK,
            ZipStatus::Miss => sys::ZE_MISS,
            ZipStatus::Eof => sys::ZE_EOF,
            ZipStatus::Form => sys::ZE_FORM,
            ZipStatus::Memory => sys::ZE_MEM,
            ZipStatus::Logic => sys::ZE_LOGIC,
            ZipStatus::TooBig => sys::ZE_BIG,
            ZipStatus::Note => sys::ZE_NOTE,
            ZipStatus::Test => sys::ZE_TEST,
            ZipStatus::Abort => sys::ZE_ABORT,
            ZipStatus::Temp => sys::ZE_TEMP,
            ZipStatus::Read => sys::ZE_READ,
            ZipStatus::Nothing => sys::ZE_NONE,
            ZipStatus::Name => sys::ZE_NAME,
            ZipStatus::Write => sys::ZE_WRITE,
            ZipStatus::Create => sys::ZE_CREAT,
            ZipStatus::Parameters => sys::ZE_PARMS,
            ZipStatus::Open => sys::ZE_OPEN,
            ZipStatus::CompileOptions => sys::ZE_COMPERR,
            ZipStatus::Zip64 => sys::ZE_ZIP64,
            ZipStatus::Unknown(code) => code,
        }
    }

    /// `Ok` is the only success value
    pub fn is_success(self) -> bool {
        self == ZipStatus::Ok
    }
}

impl fmt::Display for ZipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ZipStatus::Ok => "success",
            ZipStatus::Miss => "missing item",
            ZipStatus::Eof => "unexpected end of zip file",
            ZipStatus::Form => "zip file structure error",
            ZipStatus::Memory => "out of memory",
            ZipStatus::Logic => "internal logic error",
            ZipStatus::TooBig => "entry too large to split, read, or write",
            ZipStatus::Note => "invalid comment format",
            ZipStatus::Test => "zip test failed or out of memory",
            ZipStatus::Abort => "user interrupt or termination",
            ZipStatus::Temp => "error using a temp file",
            ZipStatus::Read => "read or seek error",
            ZipStatus::Nothing => "nothing to do",
            ZipStatus::Name => "missing or empty zip file",
            ZipStatus::Write => "error writing to a file",
            ZipStatus::Create => "couldn't open to write",
            ZipStatus::Parameters => "bad command line",
            ZipStatus::Open => "could not open a specified file to read",
            ZipStatus::CompileOptions => "error in compilation options",
            ZipStatus::Zip64 => "Zip64 not supported",
            ZipStatus::Unknown(_) => "unknown status",
        };
        f.write_str(text)
    }
}

/// Result of an unzip (extract) engine call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnzipStatus {
    /// Success
    Ok,
    /// Warning
    Warning,
    /// Error in zip file
    Error,
    /// Severe error in zip file
    BadError,
    /// Insufficient memory during initialization
    Memory,
    /// Insufficient memory for the password
    MemoryPassword,
    /// Insufficient memory during file decompression
    MemoryFile,
    /// Insufficient memory during memory decompression
    MemoryBuffer,
    /// Insufficient memory (reserved)
    MemoryReserved,
    /// Zip file not found
    NoZip,
    /// Bad or illegal parameters
    Parameters,
    /// No files found
    NotFound,
    /// Disk full
    DiskFull,
    /// Unexpected end of file
    Eof,
    /// Code outside the documented table
    Unknown(i32),
}

impl UnzipStatus {
    /// Map a native return code
    pub fn from_code(code: c_int) -> Self {
        match code {
            sys::PK_OK => UnzipStatus::Ok,
            sys::PK_WARN => UnzipStatus::Warning,
            sys::PK_ERR => UnzipStatus::Error,
            sys::PK_BADERR => UnzipStatus::BadError,
            sys::PK_MEM => UnzipStatus::Memory,
            sys::PK_MEM2 => UnzipStatus::MemoryPassword,
            sys::PK_MEM3 => UnzipStatus::MemoryFile,
            sys::PK_MEM4 => UnzipStatus::MemoryBuffer,
            sys::PK_MEM5 => UnzipStatus::MemoryReserved,
            sys::PK_NOZIP => UnzipStatus::NoZip,
            sys::PK_PARAM => UnzipStatus::Parameters,
            sys::PK_FIND => UnzipStatus::NotFound,
            sys::PK_DISK => UnzipStatus::DiskFull,
            sys::PK_EOF => UnzipStatus::Eof,
            other => UnzipStatus::Unknown(other),
        }
    }

    /// Map the return code of `Wiz_UnzipToMemory`
    ///
    /// That entry point returns a boolean where the rest of the domain returns a status:
    /// 1 means the buffer was filled and 0 means it was not. The code is inverted first
    /// and then mapped through the regular table.
    pub fn from_memory_extraction(code: c_int) -> Self {
        Self::from_code(invert_memory_code(code))
    }

    /// The native code for this status
    pub fn code(self) -> c_int {
        match self {
            UnzipStatus::Ok => sys::PK_OK,
            UnzipStatus::Warning => sys::PK_WARN,
            UnzipStatus::Error => sys::PK_ERR,
            UnzipStatus::BadError => sys::PK_BADERR,
            UnzipStatus::Memory => sys::PK_MEM,
            UnzipStatus::MemoryPassword => sys::PK_MEM2,
            UnzipStatus::MemoryFile => sys::PK_MEM3,
            UnzipStatus::MemoryBuffer => sys::PK_MEM4,
            UnzipStatus::MemoryReserved => sys::PK_MEM5,
            UnzipStatus::NoZip => sys::PK_NOZIP,
            UnzipStatus::Parameters => sys::PK_PARAM,
            UnzipStatus::NotFound => sys::PK_FIND,
            UnzipStatus::DiskFull => sys::PK_DISK,
            UnzipStatus::Eof => sys::PK_EOF,
            UnzipStatus::Unknown(code) => code,
        }
    }

    /// `Ok` is the only success value
    pub fn is_success(self) -> bool {
        self == UnzipStatus::Ok
    }

    /// One of the insufficient-memory statuses
    pub fn is_memory_error(self) -> bool {
        matches!(
            self,
            UnzipStatus::Memory
                | UnzipStatus::MemoryPassword
                | UnzipStatus::MemoryFile
                | UnzipStatus::MemoryBuffer
                | UnzipStatus::MemoryReserved
        )
    }
}

impl fmt::Display for UnzipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            UnzipStatus::Ok => "success",
            UnzipStatus::Warning => "warning",
            UnzipStatus::Error => "error in zipfile",
            UnzipStatus::BadError => "severe error in zipfile",
            UnzipStatus::Memory => "insufficient memory (initialization)",
            UnzipStatus::MemoryPassword => "insufficient memory (password)",
            UnzipStatus::MemoryFile => "insufficient memory (file decompression)",
            UnzipStatus::MemoryBuffer => "insufficient memory (memory decompression)",
            UnzipStatus::MemoryReserved => "insufficient memory",
            UnzipStatus::NoZip => "zipfile not found",
            UnzipStatus::Parameters => "bad or illegal parameters specified",
            UnzipStatus::NotFound => "no files found",
            UnzipStatus::DiskFull => "disk full",
            UnzipStatus::Eof => "unexpected end of file",
            UnzipStatus::Unknown(_) => "unknown status",
        };
        f.write_str(text)
    }
}

/// Swap the warning and success codes of `Wiz_UnzipToMemory`; other codes pass through.
pub(crate) fn invert_memory_code(code: c_int) -> c_int {
    match code {
        sys::PK_WARN => sys::PK_OK,
        sys::PK_OK => sys::PK_ERR,
        other => other,
    }
}

/// Answer to a "file exists" prompt during extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ReplaceDecision {
    /// Skip this file
    Skip,
    /// Overwrite this file
    #[default]
    OverwriteOnce,
    /// Overwrite this and every later existing file
    OverwriteAll,
    /// Never overwrite existing files
    NeverOverwrite,
    /// Extract under an automatically chosen new name
    AutoRename,
}

impl ReplaceDecision {
    /// Reply code returned to the engine from the replace callback
    pub fn code(self) -> c_int {
        match self {
            ReplaceDecision::Skip => sys::IDM_REPLACE_NO,
            ReplaceDecision::OverwriteOnce => sys::IDM_REPLACE_YES,
            ReplaceDecision::OverwriteAll => sys::IDM_REPLACE_ALL,
            ReplaceDecision::NeverOverwrite => sys::IDM_REPLACE_NONE,
            ReplaceDecision::AutoRename => sys::IDM_REPLACE_RENAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_status_table() {
        assert_eq!(ZipStatus::from_code(0), ZipStatus::Ok);
        assert_eq!(ZipStatus::from_code(-1), ZipStatus::Miss);
        assert_eq!(ZipStatus::from_code(12), ZipStatus::Nothing);
        assert_eq!(ZipStatus::from_code(18), ZipStatus::Open);
        assert_eq!(ZipStatus::from_code(17), ZipStatus::Unknown(17));
        assert_eq!(ZipStatus::from_code(1), ZipStatus::Unknown(1));

        for code in -2..=25 {
            assert_eq!(ZipStatus::from_code(code).code(), code);
        }
    }

    #[test]
    fn test_only_ok_is_success() {
        for code in -2..=60 {
            assert_eq!(ZipStatus::from_code(code).is_success(), code == 0);
            assert_eq!(UnzipStatus::from_code(code).is_success(), code == 0);
        }
    }

    #[test]
    fn test_unzip_status_table() {
        assert_eq!(UnzipStatus::from_code(1), UnzipStatus::Warning);
        assert_eq!(UnzipStatus::from_code(9), UnzipStatus::NoZip);
        assert_eq!(UnzipStatus::from_code(50), UnzipStatus::DiskFull);
        assert_eq!(UnzipStatus::from_code(51), UnzipStatus::Eof);
        assert_eq!(UnzipStatus::from_code(12), UnzipStatus::Unknown(12));
        assert!(UnzipStatus::MemoryBuffer.is_memory_error());
        assert!(!UnzipStatus::NoZip.is_memory_error());
    }

    #[test]
    fn test_memory_extraction_inversion() {
        assert_eq!(UnzipStatus::from_memory_extraction(1), UnzipStatus::Ok);
        assert_eq!(UnzipStatus::from_memory_extraction(0), UnzipStatus::Error);

        // Everything else goes through the regular table untouched
        for code in 2..=60 {
            assert_eq!(
                UnzipStatus::from_memory_extraction(code),
                UnzipStatus::from_code(code)
            );
        }
        assert_eq!(UnzipStatus::from_memory_extraction(-3), UnzipStatus::Unknown(-3));
    }

    #[test]
    fn test_replace_codes() {
        assert_eq!(ReplaceDecision::Skip.code(), 100);
        assert_eq!(ReplaceDecision::OverwriteOnce.code(), 102);
        assert_eq!(ReplaceDecision::OverwriteAll.code(), 103);
        assert_eq!(ReplaceDecision::NeverOverwrite.code(), 104);
        assert_eq!(ReplaceDecision::AutoRename.code(), 105);
        assert_eq!(ReplaceDecision::default().code(), 102);
    }
}
