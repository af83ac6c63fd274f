// 该文件是 BrainVision （脑视） 项目的一部分。
// src/model/engine.rs - 推理引擎：模型加载状态机与推理
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::{
  fmt,
  sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
  },
};

use tokio::sync::OnceCell;
use tracing::{debug, error, info};

use crate::{
  frame::InputTensor,
  model::{EngineError, ModelLoadError, RankedResult, Runtime, RuntimeLoader, WithLabel},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
  Uninitialized,
  Loading,
  Ready,
  Failed,
}

impl fmt::Display for EngineState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let text = match self {
      EngineState::Uninitialized => "UNINITIALIZED",
      EngineState::Loading => "LOADING",
      EngineState::Ready => "READY",
      EngineState::Failed => "FAILED",
    };
    f.write_str(text)
  }
}

type SharedRuntime<R> = Arc<Mutex<R>>;

/// 推理引擎。模型只加载一次，之后所有推理共享同一个会话。
///
/// 状态迁移：`Uninitialized -> Loading -> Ready`，或 `Loading -> Failed`。
/// `Ready` 与 `Failed` 都是终态，失败后不会自动重试。
/// 加载中的 future 全部被取消时回到 `Uninitialized`。
///
/// 会话本身不保证可重入，每次前向计算都在互斥锁内执行。
pub struct InferenceEngine<L: RuntimeLoader> {
  loader: Arc<L>,
  requested: AtomicBool,
  loading: AtomicUsize,
  session: OnceCell<Result<SharedRuntime<L::Runtime>, ModelLoadError>>,
}

impl<L: RuntimeLoader> InferenceEngine<L> {
  pub fn new(loader: L) -> Self {
    Self {
      loader: Arc::new(loader),
      requested: AtomicBool::new(false),
      loading: AtomicUsize::new(0),
      session: OnceCell::new(),
    }
  }

  pub fn state(&self) -> EngineState {
    match self.session.get() {
      Some(Ok(_)) => EngineState::Ready,
      Some(Err(_)) => EngineState::Failed,
      None if self.loading.load(Ordering::Acquire) > 0 => EngineState::Loading,
      None => EngineState::Uninitialized,
    }
  }

  pub fn is_ready(&self) -> bool {
    self.state() == EngineState::Ready
  }

  /// 兼容旧接口的状态字符串
  pub fn status(&self) -> &'static str {
    if self.is_ready() {
      "READY"
    } else {
      "NOT_READY"
    }
  }

  /// 加载模型。重复调用不会重新加载，只会得到同一个结果。
  pub async fn initialize(&self) -> Result<(), ModelLoadError> {
    self.requested.store(true, Ordering::Release);
    self.load_outcome().await.map(|_| ())
  }

  /// 等待加载完成；未调用过 `initialize` 时立即返回 `NotInitialized`
  pub async fn wait_until_ready(&self) -> Result<(), EngineError> {
    self.ready_runtime().await.map(|_| ())
  }

  /// 对一个张量做一次推理，返回排好序的结果。`None` 表示没有输入。
  pub async fn run<T: WithLabel, const S: u32>(
    &self,
    tensor: impl Into<Option<InputTensor<S>>>,
  ) -> Result<RankedResult<T>, EngineError> {
    let tensor = tensor
      .into()
      .ok_or_else(|| EngineError::Prediction("没有输入张量".to_string()))?;
    let runtime = self.ready_runtime().await?;

    let now = std::time::Instant::now();
    let logits = tokio::task::spawn_blocking(move || {
      let mut runtime = runtime
        .lock()
        .map_err(|_| EngineError::Prediction("推理会话锁已失效".to_string()))?;
      runtime
        .forward(&tensor)
        .map_err(|e| EngineError::Prediction(e.to_string()))
    })
    .await
    .map_err(|e| EngineError::Prediction(format!("推理任务中断: {}", e)))??;
    info!("推理完成，耗时: {:.2?}", now.elapsed());
    debug!("模型原始输出: {:?}", logits);

    RankedResult::from_logits(&logits)
  }

  async fn ready_runtime(&self) -> Result<SharedRuntime<L::Runtime>, EngineError> {
    if !self.requested.load(Ordering::Acquire) {
      return Err(EngineError::NotInitialized);
    }
    self.load_outcome().await.map_err(EngineError::NotReady)
  }

  async fn load_outcome(&self) -> Result<SharedRuntime<L::Runtime>, ModelLoadError> {
    let _loading = LoadingGuard::enter(&self.loading);
    self
      .session
      .get_or_init(|| load_runtime(self.loader.clone()))
      .await
      .clone()
  }
}

/// 存活期间计入正在等待加载结果的 future
struct LoadingGuard<'a> {
  counter: &'a AtomicUsize,
}

impl<'a> LoadingGuard<'a> {
  fn enter(counter: &'a AtomicUsize) -> Self {
    counter.fetch_add(1, Ordering::AcqRel);
    Self { counter }
  }
}

impl Drop for LoadingGuard<'_> {
  fn drop(&mut self) {
    self.counter.fetch_sub(1, Ordering::AcqRel);
  }
}

async fn load_runtime<L: RuntimeLoader>(
  loader: Arc<L>,
) -> Result<SharedRuntime<L::Runtime>, ModelLoadError> {
  let path = loader.artifact().to_path_buf();
  info!("加载模型文件: {}", path.display());
  let artifact = tokio::fs::read(&path).await.map_err(|e| {
    error!("读取模型文件失败: {}", e);
    ModelLoadError::Io {
      path: path.clone(),
      source: Arc::new(e),
    }
  })?;
  debug!(
    "模型文件大小: {:.2} MB",
    artifact.len() as f64 / (1024.0 * 1024.0)
  );

  let runtime = tokio::task::spawn_blocking(move || loader.load(&artifact))
    .await
    .map_err(|e| ModelLoadError::Interrupted(e.to_string()))?;

  match runtime {
    Ok(runtime) => {
      info!("模型加载完成");
      Ok(Arc::new(Mutex::new(runtime)))
    }
    Err(e) => {
      error!("模型加载失败: {}", e);
      Err(e)
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::model::BrainLabel;
  use std::{
    path::{Path, PathBuf},
    time::Duration,
  };

  #[derive(Debug, thiserror::Error)]
  #[error("forward failed")]
  struct ForwardFailed;

  struct FixedRuntime {
    logits: Vec<f32>,
    fail: bool,
  }

  impl Runtime for FixedRuntime {
    type Error = ForwardFailed;

    fn forward<const S: u32>(
      &mut self,
      _input: &InputTensor<S>,
    ) -> Result<Vec<f32>, ForwardFailed> {
      if self.fail {
        Err(ForwardFailed)
      } else {
        Ok(self.logits.clone())
      }
    }
  }

  struct FixedLoader {
    path: PathBuf,
    loads: Arc<AtomicUsize>,
    fail_forward: bool,
    delay: Duration,
  }

  impl RuntimeLoader for FixedLoader {
    type Runtime = FixedRuntime;

    fn artifact(&self) -> &Path {
      &self.path
    }

    fn load(&self, artifact: &[u8]) -> Result<FixedRuntime, ModelLoadError> {
      self.loads.fetch_add(1, Ordering::SeqCst);
      std::thread::sleep(self.delay);
      if artifact.is_empty() {
        return Err(ModelLoadError::ModelInvalid("empty".to_string()));
      }
      Ok(FixedRuntime {
        logits: vec![5.0, 1.0, 1.0, 1.0],
        fail: self.fail_forward,
      })
    }
  }

  type Fixture = (
    InferenceEngine<FixedLoader>,
    Arc<AtomicUsize>,
    tempfile::TempDir,
  );

  fn engine_with(contents: &[u8], fail_forward: bool) -> Fixture {
    slow_engine_with(contents, fail_forward, Duration::ZERO)
  }

  fn slow_engine_with(contents: &[u8], fail_forward: bool, delay: Duration) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("model.onnx");
    std::fs::write(&path, contents).unwrap();
    let loads = Arc::new(AtomicUsize::new(0));
    let engine = InferenceEngine::new(FixedLoader {
      path,
      loads: loads.clone(),
      fail_forward,
      delay,
    });
    (engine, loads, dir)
  }

  #[tokio::test]
  async fn run_before_initialize_is_not_ready() {
    let (engine, loads, _dir) = engine_with(b"model", false);
    assert_eq!(engine.state(), EngineState::Uninitialized);
    let err = engine
      .run::<BrainLabel, 4>(InputTensor::default())
      .await
      .unwrap_err();
    assert!(matches!(err, EngineError::NotInitialized));
    assert_eq!(loads.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn initialize_then_run_reuses_session() {
    let (engine, loads, _dir) = engine_with(b"model", false);
    engine.initialize().await.unwrap();
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(engine.status(), "READY");

    for _ in 0..3 {
      let result = engine
        .run::<BrainLabel, 4>(InputTensor::default())
        .await
        .unwrap();
      assert_eq!(result.top().unwrap().kind, BrainLabel::Glioma);
    }
    engine.initialize().await.unwrap();
    assert_eq!(loads.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn run_during_load_waits_for_outcome() {
    let (engine, loads, _dir) = engine_with(b"model", false);
    let (init, result) = tokio::join!(
      engine.initialize(),
      engine.run::<BrainLabel, 4>(InputTensor::default())
    );
    init.unwrap();
    assert_eq!(result.unwrap().len(), 4);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn state_is_loading_while_load_in_flight() {
    let (engine, loads, _dir) = slow_engine_with(b"model", false, Duration::from_millis(100));
    let (init, (mid_state, mid_status)) = tokio::join!(engine.initialize(), async {
      tokio::task::yield_now().await;
      (engine.state(), engine.status())
    });
    init.unwrap();
    assert_eq!(mid_state, EngineState::Loading);
    assert_eq!(mid_status, "NOT_READY");
    assert_eq!(engine.state(), EngineState::Ready);
    assert_eq!(loads.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn cancelled_initialize_leaves_engine_uninitialized() {
    let (engine, _loads, _dir) = slow_engine_with(b"model", false, Duration::from_millis(100));
    tokio::select! {
      biased;
      _ = engine.initialize() => panic!("load finished before cancellation"),
      _ = tokio::task::yield_now() => {}
    }
    assert_eq!(engine.state(), EngineState::Uninitialized);

    engine.initialize().await.unwrap();
    assert_eq!(engine.state(), EngineState::Ready);
  }

  #[tokio::test]
  async fn failed_load_is_terminal() {
    let (engine, loads, _dir) = engine_with(b"", false);
    assert!(matches!(
      engine.initialize().await,
      Err(ModelLoadError::ModelInvalid(_))
    ));
    assert_eq!(engine.state(), EngineState::Failed);
    assert_eq!(engine.status(), "NOT_READY");

    let err = engine
      .run::<BrainLabel, 4>(InputTensor::default())
      .await
      .unwrap_err();
    assert!(matches!(err, EngineError::NotReady(ModelLoadError::ModelInvalid(_))));
    assert!(!err.is_recoverable());

    assert!(engine.initialize().await.is_err());
    assert_eq!(loads.load(Ordering::SeqCst), 1);
  }

  #[tokio::test]
  async fn missing_artifact_is_io_error() {
    let engine = InferenceEngine::new(FixedLoader {
      path: PathBuf::from("/nonexistent/BrainVision-model.onnx"),
      loads: Arc::new(AtomicUsize::new(0)),
      fail_forward: false,
      delay: Duration::ZERO,
    });
    assert!(matches!(
      engine.initialize().await,
      Err(ModelLoadError::Io { .. })
    ));
    assert!(matches!(
      engine.wait_until_ready().await,
      Err(EngineError::NotReady(ModelLoadError::Io { .. }))
    ));
  }

  #[tokio::test]
  async fn forward_failure_is_recoverable_prediction_error() {
    let (engine, _loads, _dir) = engine_with(b"model", true);
    engine.initialize().await.unwrap();
    let err = engine
      .run::<BrainLabel, 4>(InputTensor::default())
      .await
      .unwrap_err();
    assert!(matches!(err, EngineError::Prediction(_)));
    assert!(err.is_recoverable());
    assert!(engine.is_ready());
  }

  #[tokio::test]
  async fn absent_tensor_is_prediction_error() {
    let (engine, _loads, _dir) = engine_with(b"model", false);
    engine.initialize().await.unwrap();
    let err = engine.run::<BrainLabel, 4>(None::<InputTensor<4>>).await.unwrap_err();
    assert!(matches!(err, EngineError::Prediction(_)));
  }
}
