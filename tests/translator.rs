//! End-to-end routing tests against scripted services

use std::sync::{Arc, Barrier, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use pivot_translator::boundary;
use pivot_translator::{
    CancelToken, EngineError, LanguagePair, SharedModel, TranslationError, TranslationJob,
    TranslationModel, TranslationService, Translator, TranslatorHandle,
};

/// Appends a marker naming the model version
#[derive(Debug)]
struct Marker(String);

impl TranslationModel for Marker {
    fn translate(&self, text: &str, _cancel: &CancelToken) -> Result<String, EngineError> {
        Ok(format!("{} <{}>", text, self.0))
    }
}

#[derive(Debug)]
struct Silent;

impl TranslationModel for Silent {
    fn translate(&self, _text: &str, _cancel: &CancelToken) -> Result<String, EngineError> {
        Ok(String::new())
    }
}

/// Waits on a barrier so two jobs must be in flight at the same time
#[derive(Debug)]
struct Rendezvous(Arc<Barrier>, &'static str);

impl TranslationModel for Rendezvous {
    fn translate(&self, text: &str, _cancel: &CancelToken) -> Result<String, EngineError> {
        self.0.wait();
        Ok(format!("{}:{}", self.1, text))
    }
}

/// Spins until cancelled
#[derive(Debug)]
struct Stuck;

impl TranslationModel for Stuck {
    fn translate(&self, _text: &str, cancel: &CancelToken) -> Result<String, EngineError> {
        while !cancel.is_cancelled() {
            thread::sleep(Duration::from_millis(5));
        }
        Err(EngineError::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Submission {
    text: String,
}

/// Records every submission, then runs it on its own thread or never completes it
#[derive(Default)]
struct Scripted {
    submissions: Mutex<Vec<Submission>>,
    parked: Mutex<Vec<TranslationJob>>,
    never_complete: bool,
}

impl Scripted {
    fn never_completing() -> Self {
        Self {
            never_complete: true,
            ..Default::default()
        }
    }

    fn inputs(&self) -> Vec<String> {
        self.submissions
            .lock()
            .unwrap()
            .iter()
            .map(|s| s.text.clone())
            .collect()
    }
}

impl TranslationService for Scripted {
    fn submit(&self, job: TranslationJob) {
        self.submissions.lock().unwrap().push(Submission {
            text: job.text.clone(),
        });

        if self.never_complete {
            self.parked.lock().unwrap().push(job);
        } else {
            thread::spawn(move || job.execute());
        }
    }
}

fn loader(config: &str) -> anyhow::Result<SharedModel> {
    match config {
        "silent" => Ok(Arc::new(Silent)),
        "stuck" => Ok(Arc::new(Stuck)),
        version => Ok(Arc::new(Marker(version.to_string()))),
    }
}

fn handle_with(service: Arc<Scripted>, timeout: Duration) -> TranslatorHandle {
    TranslatorHandle::with_service(service, Arc::new(loader), timeout)
}

#[test]
fn direct_path_wins_over_pivot() {
    let service = Arc::new(Scripted::default());
    let handle = handle_with(service.clone(), Duration::from_secs(5));
    handle.load_model("fr", "de", "fr-de").unwrap();
    handle.load_model("fr", "en", "fr-en").unwrap();
    handle.load_model("en", "de", "en-de").unwrap();

    let text = handle.translate("fr", "de", "Bonjour").unwrap();

    assert_eq!(text, "Bonjour <fr-de>");
    assert_eq!(service.inputs(), vec!["Bonjour"]);
}

#[test]
fn pivot_runs_two_legs_in_order() {
    let service = Arc::new(Scripted::default());
    let handle = handle_with(service.clone(), Duration::from_secs(5));
    handle.load_model("fr", "en", "fr-en").unwrap();
    handle.load_model("en", "de", "en-de").unwrap();

    let text = handle.translate("fr", "de", "Bonjour").unwrap();

    assert_eq!(text, "Bonjour <fr-en> <en-de>");
    assert_eq!(service.inputs(), vec!["Bonjour", "Bonjour <fr-en>"]);
}

#[test]
fn empty_intermediate_never_submits_second_leg() {
    let service = Arc::new(Scripted::default());
    let handle = handle_with(service.clone(), Duration::from_secs(5));
    handle.load_model("fr", "en", "silent").unwrap();
    handle.load_model("en", "de", "en-de").unwrap();

    let err = handle.translate("fr", "de", "Bonjour").unwrap_err();

    assert!(matches!(
        err,
        TranslationError::IntermediateEmpty { ref pair } if *pair == LanguagePair::new("fr", "en").unwrap()
    ));
    assert_eq!(service.inputs().len(), 1);

    let translator = Translator::from_handle(handle);
    assert!(translator.translate("fr", "de", "Bonjour").is_none());
}

#[test]
fn unsupported_pair_submits_nothing() {
    let service = Arc::new(Scripted::default());
    let translator = Translator::from_handle(handle_with(service.clone(), Duration::from_secs(5)));
    translator.load_model("fr", "en", "fr-en");

    assert!(!translator.is_supported("fr", "de"));
    assert!(translator.translate("fr", "de", "Bonjour").is_none());
    assert!(service.inputs().is_empty());
}

#[test]
fn reload_uses_latest_model() {
    let service = Arc::new(Scripted::default());
    let translator = Translator::from_handle(handle_with(service, Duration::from_secs(5)));
    translator.load_model("en", "fr", "first");
    translator.load_model("en", "fr", "second");

    let text = translator.translate("en", "fr", "hello").unwrap();
    assert_eq!(text.as_str(), "hello <second>");
    boundary::release_text(text);
}

#[test]
fn missing_callback_times_out() {
    let service = Arc::new(Scripted::never_completing());
    let handle = handle_with(service.clone(), Duration::from_millis(100));
    handle.load_model("en", "fr", "en-fr").unwrap();

    let started = Instant::now();
    let err = handle.translate("en", "fr", "hello").unwrap_err();

    assert!(matches!(err, TranslationError::Timeout { .. }));
    assert!(started.elapsed() < Duration::from_secs(5));

    let parked = service.parked.lock().unwrap();
    assert!(parked[0].cancel.is_cancelled());
}

#[test]
fn timeout_stops_engine_work() {
    let handle = TranslatorHandle::create(1, Arc::new(loader))
        .unwrap()
        .with_timeout(Duration::from_millis(100));
    handle.load_model("en", "fr", "stuck").unwrap();
    handle.load_model("en", "de", "en-de").unwrap();

    let err = handle.translate("en", "fr", "hello").unwrap_err();
    assert_eq!(err.kind(), "timeout");

    // The single worker is released once the stuck job sees its cancel token.
    let handle = handle.with_timeout(Duration::from_secs(5));
    assert_eq!(handle.translate("en", "de", "hello").unwrap(), "hello <en-de>");
}

#[test]
fn concurrent_translations_do_not_block_each_other() {
    let barrier = Arc::new(Barrier::new(2));
    let handle = Arc::new(
        TranslatorHandle::create(2, Arc::new(loader))
            .unwrap()
            .with_timeout(Duration::from_secs(5)),
    );
    handle
        .insert_model(
            LanguagePair::new("en", "fr").unwrap(),
            Arc::new(Rendezvous(barrier.clone(), "fr")),
        )
        .unwrap();
    handle
        .insert_model(
            LanguagePair::new("en", "de").unwrap(),
            Arc::new(Rendezvous(barrier, "de")),
        )
        .unwrap();

    let french = {
        let handle = handle.clone();
        thread::spawn(move || handle.translate("en", "fr", "one"))
    };
    let german = {
        let handle = handle.clone();
        thread::spawn(move || handle.translate("en", "de", "two"))
    };

    assert_eq!(french.join().unwrap().unwrap(), "fr:one");
    assert_eq!(german.join().unwrap().unwrap(), "de:two");
}

#[test]
fn is_supported_follows_pivot_rule() {
    let service = Arc::new(Scripted::default());
    let translator = Translator::from_handle(handle_with(service, Duration::from_secs(5)));
    translator.load_model("fr", "en", "a");
    translator.load_model("en", "de", "b");
    translator.load_model("ja", "zh", "c");

    assert!(translator.is_supported("fr", "en"));
    assert!(translator.is_supported("fr", "de"));
    assert!(translator.is_supported("ja", "zh"));
    assert!(!translator.is_supported("de", "fr"));
    assert!(!translator.is_supported("ja", "de"));
    assert!(!translator.is_supported("fr", "zh"));
}
