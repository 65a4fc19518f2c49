use std::collections::VecDeque;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;
use pedalboard::audio::{
    process_loop, AudioEngine, AudioHost, CancelToken, DeviceInfo, EngineConfig, OpenStream,
    PushOutcome, StreamFormat, StreamGuard, StreamPort,
};
use pedalboard::fx::{EffectChain, ParamStore};
use pedalboard::{EngineError, EngineResult};

const FORMAT: StreamFormat = StreamFormat {
    sample_rate: 44100,
    channels: 2,
    frame_capacity: 64,
};

enum Step {
    Block(Vec<f32>),
    Idle,
    Fault,
}

/// Scripted port: plays back `steps`, then cancels the token
struct ScriptedPort {
    steps: VecDeque<Step>,
    /// Render headroom reported after each pulled block
    headroom: VecDeque<usize>,
    current_headroom: usize,
    overruns: u64,
    rendered: Arc<Mutex<Vec<f32>>>,
    token: CancelToken,
}

impl ScriptedPort {
    fn new(steps: Vec<Step>, token: CancelToken) -> Self {
        Self {
            steps: steps.into(),
            headroom: VecDeque::new(),
            current_headroom: usize::MAX,
            overruns: 0,
            rendered: Arc::new(Mutex::new(Vec::new())),
            token,
        }
    }
}

impl StreamPort for ScriptedPort {
    fn format(&self) -> StreamFormat {
        FORMAT
    }

    fn pull_captured(&mut self, out: &mut [f32]) -> EngineResult<usize> {
        match self.steps.pop_front() {
            Some(Step::Block(samples)) => {
                self.current_headroom = self.headroom.pop_front().unwrap_or(usize::MAX);
                out[..samples.len()].copy_from_slice(&samples);
                Ok(samples.len() / FORMAT.channels)
            }
            Some(Step::Idle) => Ok(0),
            Some(Step::Fault) => Err(EngineError::StreamFault("device unplugged".into())),
            None => {
                self.token.cancel();
                Ok(0)
            }
        }
    }

    fn render_headroom(&self) -> usize {
        self.current_headroom
    }

    fn push_render(&mut self, block: &[f32]) -> EngineResult<PushOutcome> {
        self.rendered.lock().extend_from_slice(block);
        Ok(PushOutcome::Rendered)
    }

    fn capture_overruns(&self) -> u64 {
        self.overruns
    }
}

fn chain(volume: f32) -> EffectChain {
    let params = Arc::new(ParamStore::new());
    params.set_master_volume(volume);
    let mut chain = EffectChain::new(params, FORMAT.sample_rate as f32);
    chain.prepare(FORMAT.sample_rate as f32, FORMAT.channels);
    chain
}

#[test]
fn processes_blocks_and_tolerates_idle_polls() {
    let token = CancelToken::new();
    let mut port = ScriptedPort::new(
        vec![
            Step::Idle,
            Step::Block(vec![0.5; 32]),
            Step::Idle,
            Step::Block(vec![-1.0; 8]),
        ],
        token.clone(),
    );
    let rendered = Arc::clone(&port.rendered);
    let mut chain = chain(0.5);

    let stats = process_loop(&mut port, &mut chain, &token, Duration::from_micros(10));

    assert_eq!(stats.buffers_processed, 2);
    assert_eq!(stats.frames_processed, 20);
    assert_eq!(stats.buffers_dropped, 0);
    assert!(stats.idle_polls >= 2);
    assert_eq!(stats.fault, None);

    let rendered = rendered.lock();
    assert_eq!(rendered.len(), 40);
    assert!(rendered[..32].iter().all(|&s| s == 0.25));
    assert!(rendered[32..].iter().all(|&s| s == -0.5));
}

#[test]
fn skips_whole_buffer_without_headroom() {
    let token = CancelToken::new();
    let mut port = ScriptedPort::new(
        vec![Step::Block(vec![0.1; 64]), Step::Block(vec![0.2; 16])],
        token.clone(),
    );
    // 32 frames arrive but only 4 fit
    port.headroom.push_back(4);
    let rendered = Arc::clone(&port.rendered);
    let mut chain = chain(1.0);

    let stats = process_loop(&mut port, &mut chain, &token, Duration::from_micros(10));

    assert_eq!(stats.buffers_dropped, 1);
    assert_eq!(stats.buffers_processed, 1);
    // Only the second block reaches the render side
    assert_eq!(*rendered.lock(), vec![0.2; 16]);
}

#[test]
fn capture_overruns_reach_the_session_summary() {
    let token = CancelToken::new();
    let mut port = ScriptedPort::new(vec![Step::Block(vec![0.1; 8])], token.clone());
    port.overruns = 3;
    let mut chain = chain(1.0);

    let stats = process_loop(&mut port, &mut chain, &token, Duration::from_micros(10));
    assert_eq!(stats.capture_overruns, 3);
    assert_eq!(stats.buffers_processed, 1);
}

#[test]
fn fault_ends_the_session() {
    let token = CancelToken::new();
    let mut port = ScriptedPort::new(
        vec![
            Step::Block(vec![0.3; 4]),
            Step::Fault,
            Step::Block(vec![0.3; 4]),
        ],
        token.clone(),
    );
    let mut chain = chain(1.0);

    let stats = process_loop(&mut port, &mut chain, &token, Duration::from_micros(10));

    assert_eq!(stats.buffers_processed, 1);
    assert!(stats.fault.as_deref().unwrap().contains("unplugged"));
    assert!(!token.is_cancelled());
}

#[test]
fn cancelled_token_stops_before_pulling() {
    let token = CancelToken::new();
    token.cancel();
    let mut port = ScriptedPort::new(vec![Step::Block(vec![0.3; 4])], token.clone());
    let mut chain = chain(1.0);

    let stats = process_loop(&mut port, &mut chain, &token, Duration::from_micros(10));
    assert_eq!(stats.buffers_processed, 0);
    assert_eq!(port.steps.len(), 1);
}

/// Port that idles forever, for engine start/stop
struct IdlePort;

impl StreamPort for IdlePort {
    fn format(&self) -> StreamFormat {
        FORMAT
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

struct FakeHost;

impl AudioHost for FakeHost {
    type Port = IdlePort;

    fn input_devices(&self) -> EngineResult<Vec<DeviceInfo>> {
        Ok(vec![DeviceInfo {
            id: "fake".into(),
            name: "Fake Input".into(),
            is_default: true,
            channels: 2,
            sample_rate: 44100,
        }])
    }

    fn open_stream(&self, device_id: Option<&str>) -> EngineResult<OpenStream<IdlePort>> {
        match device_id {
            None | Some("fake") => Ok(OpenStream {
                format: FORMAT,
                port: IdlePort,
                guard: StreamGuard::detached(),
            }),
            Some(other) => Err(EngineError::DeviceNotFound(other.to_string())),
        }
    }
}

#[test]
fn engine_starts_restarts_and_stops() {
    let params = Arc::new(ParamStore::new());
    let mut engine = AudioEngine::new(FakeHost, params, EngineConfig::default());
    assert!(!engine.is_running());
    assert_eq!(engine.input_devices().unwrap().len(), 1);

    let format = engine.start_processing(None).unwrap();
    assert_eq!(format, FORMAT);
    assert!(engine.is_running());

    // Restarting stops the old session first
    engine.start_processing(Some("fake")).unwrap();
    assert_eq!(engine.device(), Some("fake"));
    assert!(engine.last_stats().is_some());

    thread::sleep(Duration::from_millis(5));
    let stats = engine.stop().unwrap();
    assert!(stats.idle_polls > 0);
    assert!(!engine.is_running());
    assert!(engine.stop().is_none());
}

#[test]
fn unknown_device_does_not_start() {
    let params = Arc::new(ParamStore::new());
    let mut engine = AudioEngine::new(FakeHost, params, EngineConfig::default());
    let err = engine.start_processing(Some("missing")).unwrap_err();
    assert_eq!(err, EngineError::DeviceNotFound("missing".into()));
    assert!(!engine.is_running());
}
