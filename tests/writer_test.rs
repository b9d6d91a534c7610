use std::cell::{Cell, RefCell};
use std::ffi::{CStr, c_char, c_int, c_uint};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use infozip::{
    CompressionLevel, Error, Recurse, ServiceNotification, WriteListener, WriteMode, WriteOptions,
    ZipStatus, ZipWriter,
};
use infozip_sys::{
    CallbackString, ZE_NONE, ZE_OK, ZipFunctions, ZipLibrary, ZipOptions, ZipUserFunctions,
};

// In-process stand-in for zip32: same entry point signatures, driving the real
// trampolines. State is per test thread.

#[derive(Debug, Clone, Default)]
struct Submitted {
    mode: Option<WriteMode>,
    encrypt: c_int,
    comment: c_int,
    level: u8,
    recurse: c_int,
    root_dir: Option<String>,
}

#[derive(Debug, Default)]
struct EngineLog {
    init_calls: usize,
    archive: Option<String>,
    masks: Vec<String>,
    options: Option<Submitted>,
    comment: Option<(c_int, String)>,
    password: Option<(c_int, Vec<u8>)>,
}

thread_local! {
    static CALLBACKS: Cell<Option<ZipUserFunctions>> = const { Cell::new(None) };
    static LOG: RefCell<EngineLog> = RefCell::new(EngineLog::default());
    static INIT_RESULT: Cell<c_int> = const { Cell::new(1) };
    static ALWAYS_PROMPT: Cell<bool> = const { Cell::new(false) };
    static ECHO_MASKS: Cell<bool> = const { Cell::new(false) };
}

const PASSWORD_SENTINEL: c_char = 0x55;

unsafe fn c_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        None
    } else {
        // The engine speaks single-byte text
        let bytes = unsafe { CStr::from_ptr(ptr) }.to_bytes();
        Some(bytes.iter().map(|&b| char::from(b)).collect())
    }
}

fn message(text: &str) -> CallbackString {
    let mut message = CallbackString::default();
    for (slot, c) in message.buffer.iter_mut().zip(text.chars()) {
        *slot = u8::try_from(c).unwrap_or(b'?');
    }
    message
}

fn text_of(message: &CallbackString) -> String {
    let end = message.buffer.iter().position(|&b| b == 0).unwrap_or(message.buffer.len());
    message.buffer[..end].iter().map(|&b| char::from(b)).collect()
}

unsafe extern "system" fn mock_init(functions: *mut ZipUserFunctions) -> c_int {
    CALLBACKS.with(|slot| slot.set(Some(unsafe { *functions })));
    LOG.with(|log| log.borrow_mut().init_calls += 1);
    INIT_RESULT.with(Cell::get)
}

unsafe extern "system" fn mock_set_options(options: *mut ZipOptions) -> c_int {
    let options = unsafe { &*options };
    let submitted = Submitted {
        mode: WriteMode::of(options),
        encrypt: options.encrypt,
        comment: options.comment,
        level: options.level as u8,
        recurse: options.recurse,
        root_dir: unsafe { c_string(options.root_dir) },
    };
    LOG.with(|log| log.borrow_mut().options = Some(submitted));
    1
}

unsafe extern "system" fn mock_archive(
    argc: c_int,
    archive: *const c_char,
    names: *const *const c_char,
) -> c_int {
    let archive = unsafe { c_string(archive) }.unwrap_or_default();
    let masks: Vec<String> = (0..argc as usize)
        .map(|i| unsafe { c_string(*names.add(i)) }.unwrap_or_default())
        .collect();
    let callbacks = CALLBACKS.with(Cell::get).unwrap_or_default();
    let options = LOG.with(|log| log.borrow().options.clone()).unwrap_or_default();
    LOG.with(|log| {
        let mut log = log.borrow_mut();
        log.archive = Some(archive);
        log.masks = masks.clone();
    });

    let prompt = ALWAYS_PROMPT.with(Cell::get);
    if options.comment != 0 || prompt {
        if let Some(comment) = callbacks.comment {
            let mut text = message("previous comment");
            let code = unsafe { comment(&mut text) };
            LOG.with(|log| log.borrow_mut().comment = Some((code, text_of(&text))));
        }
    }
    if options.encrypt != 0 || prompt {
        if let Some(password) = callbacks.password {
            let mut buffer = [PASSWORD_SENTINEL; 81];
            let code = unsafe {
                password(
                    buffer.as_mut_ptr(),
                    buffer.len() as c_int,
                    c"Enter password: ".as_ptr(),
                    c"test.zip".as_ptr(),
                )
            };
            let bytes = buffer.iter().map(|&b| b as u8).collect();
            LOG.with(|log| log.borrow_mut().password = Some((code, bytes)));
        }
    }

    if ECHO_MASKS.with(Cell::get) {
        for mask in &masks {
            let mut text = message(mask);
            if let Some(service) = callbacks.service {
                unsafe { service(&mut text, 0) };
            }
        }
        return ZE_OK;
    }

    let mut matched = 0;
    for mask in &masks {
        let Ok(paths) = glob::glob(mask) else {
            continue;
        };
        for path in paths.flatten() {
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let size = fs::metadata(&path).map(|m| m.len() as c_uint).unwrap_or(0);

            let line = format!("  adding: {name}");
            let mut text = message(&line);
            if let Some(print) = callbacks.print {
                unsafe { print(&mut text, line.len() as c_uint) };
            }
            let mut text = message(&name);
            if let Some(service) = callbacks.service {
                unsafe { service(&mut text, size) };
            }
            matched += 1;
        }
    }

    if matched == 0 { ZE_NONE } else { ZE_OK }
}

fn engine() -> Arc<ZipLibrary> {
    LOG.with(|log| *log.borrow_mut() = EngineLog::default());
    CALLBACKS.with(|slot| slot.set(None));
    Arc::new(ZipLibrary::from_functions(ZipFunctions {
        init: mock_init,
        set_options: mock_set_options,
        archive: mock_archive,
    }))
}

#[derive(Default)]
struct Recorder {
    prints: Vec<String>,
    services: Vec<ServiceNotification>,
}

impl WriteListener for Recorder {
    fn on_print(&mut self, message: &str) {
        self.prints.push(message.to_string());
    }

    fn on_service(&mut self, notification: &ServiceNotification) {
        self.services.push(notification.clone());
    }
}

fn photo_dir() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("beach.jpg"), vec![1u8; 1200]).unwrap();
    fs::write(dir.path().join("sunset.jpg"), vec![2u8; 345]).unwrap();
    fs::write(dir.path().join("notes.txt"), b"not a photo").unwrap();
    dir
}

fn mask(dir: &Path, pattern: &str) -> String {
    dir.join(pattern).to_string_lossy().into_owned()
}

fn run(
    writer: &ZipWriter,
    mode: WriteMode,
    masks: &[String],
    listener: &mut dyn WriteListener,
) -> infozip::Result<()> {
    match mode {
        WriteMode::Add => writer.add_files(masks, listener),
        WriteMode::Update => writer.update_files(masks, listener),
        WriteMode::Freshen => writer.freshen_files(masks, listener),
        WriteMode::Move => writer.move_files(masks, listener),
        WriteMode::Delete => writer.delete_files(masks, listener),
    }
}

#[test]
fn test_add_files_end_to_end() {
    let dir = photo_dir();
    let writer = ZipWriter::new("test.zip")
        .password("secret")
        .comment("demo")
        .library(engine());

    let mut recorder = Recorder::default();
    writer
        .add_files(&[mask(dir.path(), "*.jpg")], &mut recorder)
        .unwrap();

    let mut names: Vec<&str> = recorder.services.iter().map(|s| s.name()).collect();
    names.sort();
    assert_eq!(names, vec!["beach.jpg", "sunset.jpg"]);
    let beach = recorder.services.iter().find(|s| s.name() == "beach.jpg").unwrap();
    assert_eq!(beach.size(), 1200);
    assert_eq!(recorder.prints.len(), 2);
    assert!(recorder.prints.iter().all(|p| p.starts_with("  adding: ")));

    LOG.with(|log| {
        let log = log.borrow();
        assert_eq!(log.init_calls, 1);
        assert_eq!(log.archive.as_deref(), Some("test.zip"));

        let options = log.options.as_ref().unwrap();
        assert_eq!(options.mode, Some(WriteMode::Add));
        assert_eq!((options.encrypt, options.comment), (1, 1));

        let (code, comment) = log.comment.clone().unwrap();
        assert_eq!(code, 0);
        assert_eq!(comment, "demo");

        let (code, password) = log.password.clone().unwrap();
        assert_eq!(code, 0);
        assert_eq!(&password[..6], b"secret");
        assert!(password[6..].iter().all(|&b| b == 0));
    });
}

#[test]
fn test_each_operation_submits_its_mode() {
    let dir = photo_dir();
    let library = engine();
    let writer = ZipWriter::new("photos.zip").library(library);
    let masks = [mask(dir.path(), "*.jpg")];

    for mode in [
        WriteMode::Add,
        WriteMode::Update,
        WriteMode::Freshen,
        WriteMode::Move,
        WriteMode::Delete,
    ] {
        run(&writer, mode, &masks, &mut ()).unwrap();
        let submitted = LOG.with(|log| log.borrow().options.clone()).unwrap();
        assert_eq!(submitted.mode, Some(mode));
    }
}

#[test]
fn test_single_mask_overload() {
    let dir = photo_dir();
    let writer = ZipWriter::new("test.zip").library(engine());
    let mut recorder = Recorder::default();

    writer
        .update_file(&mask(dir.path(), "beach.*"), &mut recorder)
        .unwrap();

    assert_eq!(recorder.services.len(), 1);
    LOG.with(|log| assert_eq!(log.borrow().masks.len(), 1));
}

#[test]
fn test_options_reach_engine() {
    let dir = photo_dir();
    let options = WriteOptions {
        compression_level: CompressionLevel::Level3,
        recurse: Recurse::Subdirectories,
        ..WriteOptions::default()
    };
    let writer = ZipWriter::new("test.zip")
        .options(options)
        .root_folder(dir.path())
        .library(engine());

    writer.add_files(&[mask(dir.path(), "*.txt")], &mut ()).unwrap();

    let submitted = LOG.with(|log| log.borrow().options.clone()).unwrap();
    assert_eq!(submitted.level, b'3');
    assert_eq!(submitted.recurse, 1);
    assert_eq!(submitted.root_dir.as_deref(), dir.path().to_str());
    assert_eq!((submitted.encrypt, submitted.comment), (0, 0));
}

#[test]
fn test_nothing_to_do_is_reported() {
    let dir = photo_dir();
    let writer = ZipWriter::new("test.zip").library(engine());
    let mut recorder = Recorder::default();

    let result = writer.add_files(&[mask(dir.path(), "*.png")], &mut recorder);

    assert!(matches!(result, Err(Error::Zip(ZipStatus::Nothing))));
    assert_eq!(result.unwrap_err().code(), Some(12));
    assert!(recorder.services.is_empty());
}

#[test]
fn test_unconfigured_secrets_are_not_supplied() {
    let dir = photo_dir();
    let writer = ZipWriter::new("test.zip")
        .password("")
        .library(engine());
    ALWAYS_PROMPT.with(|p| p.set(true));

    writer.add_files(&[mask(dir.path(), "*.jpg")], &mut ()).unwrap();
    ALWAYS_PROMPT.with(|p| p.set(false));

    LOG.with(|log| {
        let log = log.borrow();
        let options = log.options.as_ref().unwrap();
        assert_eq!((options.encrypt, options.comment), (0, 0));

        let (code, comment) = log.comment.clone().unwrap();
        assert_eq!(code, 1);
        assert_eq!(comment, "previous comment");

        let (code, password) = log.password.clone().unwrap();
        assert_eq!(code, 1);
        assert!(password.iter().all(|&b| b == PASSWORD_SENTINEL as u8));
    });
}

#[test]
fn test_non_ascii_masks_round_trip() {
    let writer = ZipWriter::new("Fotos für Zoë.zip").library(engine());
    ECHO_MASKS.with(|e| e.set(true));

    let mut recorder = Recorder::default();
    let result = writer.add_files(&["café.jpg", "Größe ½.txt"], &mut recorder);
    ECHO_MASKS.with(|e| e.set(false));

    result.unwrap();
    let names: Vec<&str> = recorder.services.iter().map(|s| s.name()).collect();
    assert_eq!(names, vec!["café.jpg", "Größe ½.txt"]);
    LOG.with(|log| {
        let log = log.borrow();
        assert_eq!(log.archive.as_deref(), Some("Fotos für Zoë.zip"));
        assert_eq!(log.masks, vec!["café.jpg".to_string(), "Größe ½.txt".to_string()]);
    });
}

#[test]
fn test_mask_outside_latin1_rejected() {
    let writer = ZipWriter::new("test.zip").library(engine());

    let result = writer.add_file("写真.jpg", &mut ());

    assert!(matches!(result, Err(Error::Encoding(_))));
    LOG.with(|log| assert_eq!(log.borrow().init_calls, 0));
}

#[test]
fn test_empty_masks_rejected_before_engine() {
    let writer = ZipWriter::new("test.zip").library(engine());
    let masks: [&str; 0] = [];

    let result = writer.add_files(&masks, &mut ());

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    LOG.with(|log| assert_eq!(log.borrow().init_calls, 0));
}

#[test]
fn test_empty_archive_name_rejected() {
    let writer = ZipWriter::new("").library(engine());

    let result = writer.delete_file("*.jpg", &mut ());

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    LOG.with(|log| assert_eq!(log.borrow().init_calls, 0));
}

#[test]
fn test_mask_with_nul_rejected() {
    let writer = ZipWriter::new("test.zip").library(engine());

    let result = writer.add_file("bad\0mask", &mut ());

    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_init_failure() {
    let dir = photo_dir();
    let writer = ZipWriter::new("test.zip").library(engine());
    INIT_RESULT.with(|r| r.set(0));

    let mut recorder = Recorder::default();
    let result = writer.add_files(&[mask(dir.path(), "*.jpg")], &mut recorder);
    INIT_RESULT.with(|r| r.set(1));

    assert!(matches!(result, Err(Error::InitializationFailed)));
    assert!(recorder.services.is_empty());
    LOG.with(|log| assert!(log.borrow().archive.is_none()));
}

#[test]
fn test_missing_library_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ZipWriter::new("test.zip").library_path(dir.path().join("libzip32-missing.so"));

    let result = writer.add_file("*.jpg", &mut ());

    match result {
        Err(Error::LibraryUnavailable { library, .. }) => {
            assert!(library.ends_with("libzip32-missing.so"));
        }
        other => panic!("expected LibraryUnavailable, got {:?}", other),
    }
}
