use std::sync::Arc;

use pedalboard::app::App;
use pedalboard::audio::{
    AudioEngine, AudioHost, DeviceInfo, EngineConfig, OpenStream, PushOutcome, StreamFormat,
    StreamGuard, StreamPort,
};
use pedalboard::command::{parse_line, Command, CommandSource};
use pedalboard::fx::{EffectKind, ParamId, ParamStore};
use pedalboard::{EngineError, EngineResult};

struct SilentPort;

impl StreamPort for SilentPort {
    fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: 48000,
            channels: 2,
            frame_capacity: 128,
        }
    }

    fn pull_captured(&mut self, _out: &mut [f32]) -> EngineResult<usize> {
        Ok(0)
    }

    fn render_headroom(&self) -> usize {
        usize::MAX
    }

    fn push_render(&mut self, _block: &[f32]) -> EngineResult<PushOutcome> {
        Ok(PushOutcome::Rendered)
    }
}

struct NoInputs;

impl AudioHost for NoInputs {
    type Port = SilentPort;

    fn input_devices(&self) -> EngineResult<Vec<DeviceInfo>> {
        Ok(Vec::new())
    }

    fn open_stream(&self, device_id: Option<&str>) -> EngineResult<OpenStream<SilentPort>> {
        match device_id {
            Some("loopback") => Ok(OpenStream {
                format: SilentPort.format(),
                port: SilentPort,
                guard: StreamGuard::detached(),
            }),
            _ => Err(EngineError::NoDevice),
        }
    }
}

fn app() -> (App<NoInputs>, Arc<ParamStore>) {
    let params = Arc::new(ParamStore::new());
    let engine = AudioEngine::new(NoInputs, Arc::clone(&params), EngineConfig::default());
    (App::new(engine), params)
}

fn run(app: &mut App<NoInputs>, line: &str) -> String {
    app.apply(parse_line(line).unwrap(), CommandSource::Console)
        .unwrap()
}

#[test]
fn console_lines_reach_the_param_store() {
    let (mut app, params) = app();

    assert_eq!(run(&mut app, "set reverb_mix 0.4"), "reverb_mix = 0.4");
    assert_eq!(run(&mut app, "set tremolo_depth 7"), "tremolo_depth = 1");
    run(&mut app, "on chorus");
    run(&mut app, "toggle wah");

    assert_eq!(params.get(ParamId::ReverbMix), 0.4);
    assert_eq!(params.get(ParamId::TremoloDepth), 1.0);
    assert!(params.is_enabled(EffectKind::Chorus));
    assert!(params.is_enabled(EffectKind::Wah));

    run(&mut app, "reset");
    assert!(!params.is_enabled(EffectKind::Chorus));
    assert_eq!(params.get(ParamId::ReverbMix), ParamId::ReverbMix.default_value());
}

#[test]
fn history_records_changes_but_not_queries() {
    let (mut app, _params) = app();
    run(&mut app, "set wah_q 3");
    run(&mut app, "status");
    run(&mut app, "off reverb");

    assert_eq!(app.event_log().len(), 2);
    let history = run(&mut app, "history 1");
    assert!(history.contains("Turn Reverb off"));
    assert!(!history.contains("wah"));
}

#[test]
fn status_is_json() {
    let (mut app, _params) = app();
    run(&mut app, "on warm");
    let status: serde_json::Value = serde_json::from_str(&run(&mut app, "status")).unwrap();
    assert_eq!(status["running"], false);
    assert_eq!(status["params"]["enabled"]["warm"], true);
}

#[test]
fn device_failures_are_reported_not_fatal() {
    let (mut app, _params) = app();
    let err = app
        .apply(Command::StartProcessing { device: None }, CommandSource::Cli)
        .unwrap_err();
    assert!(format!("{:#}", err).contains("No audio input device"));
    assert!(!app.engine().is_running());

    run(&mut app, "start loopback");
    assert!(app.engine().is_running());
    assert!(run(&mut app, "stop").starts_with("stopped"));
    assert_eq!(run(&mut app, "stop"), "not running");
}

#[test]
fn quit_sets_the_flag() {
    let (mut app, _params) = app();
    assert!(!app.should_quit());
    run(&mut app, "quit");
    assert!(app.should_quit());
}
