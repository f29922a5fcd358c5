use std::sync::{
    OnceLock,
    atomic::{AtomicBool, Ordering},
};

use tracing::{debug, error, info, warn};

use crate::backend::{TranslationBackend, TranslationModel};

/// 翻译能力缺失或模型加载失败时的返回值
pub const UNAVAILABLE_MARKER: &str = "[Translation unavailable]";
/// 单次翻译失败时的返回值
pub const ERROR_MARKER: &str = "[Translation error]";
/// 默认输入截断长度
pub const DEFAULT_MAX_LENGTH: usize = 512;

/// 翻译器状态
///
/// `Uninitialized -> Loading -> Ready` 或 `Uninitialized -> Loading -> Unavailable`,
/// 进入 `Unavailable` 后不再重试
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslatorState {
    Uninitialized,
    Loading,
    Ready,
    Unavailable,
}

/// 整句翻译器
///
/// 模型在第一次翻译时加载, 且每个实例至多加载一次. 多个线程同时首次调用时只有一个线程执行加载,
/// 其余线程等待并得到相同的结果.
pub struct Translator {
    backend: Option<Box<dyn TranslationBackend>>,
    model: OnceLock<Option<Box<dyn TranslationModel>>>,
    loading: AtomicBool,
    max_length: usize,
}

impl Translator {
    /// 创建翻译器, 不加载模型
    ///
    /// # 参数
    ///
    /// * `backend` - 翻译能力, `None` 表示未安装
    /// * `max_length` - 输入截断长度
    pub fn new(backend: Option<Box<dyn TranslationBackend>>, max_length: usize) -> Self {
        if backend.is_none() {
            warn!("未配置翻译模型, 翻译功能不可用");
        }
        Self {
            backend,
            model: OnceLock::new(),
            loading: AtomicBool::new(false),
            max_length,
        }
    }

    /// 未安装翻译能力的翻译器
    pub fn unavailable() -> Self {
        Self::new(None, DEFAULT_MAX_LENGTH)
    }

    /// 当前状态
    ///
    /// 加载标记在加载结束后不再清除, 结果写入后以结果为准
    pub fn state(&self) -> TranslatorState {
        if self.backend.is_none() {
            return TranslatorState::Unavailable;
        }
        match self.model.get() {
            Some(Some(_)) => TranslatorState::Ready,
            Some(None) => TranslatorState::Unavailable,
            None if self.loading.load(Ordering::Acquire) => TranslatorState::Loading,
            None => TranslatorState::Uninitialized,
        }
    }

    /// 获取模型, 首次调用时加载
    fn model(&self) -> Option<&dyn TranslationModel> {
        let backend = self.backend.as_ref()?;
        self.model
            .get_or_init(|| {
                self.loading.store(true, Ordering::Release);
                info!("正在加载翻译模型");
                let model = match backend.load() {
                    Ok(model) => {
                        info!("翻译模型加载成功");
                        Some(model)
                    }
                    Err(e) => {
                        error!("翻译模型加载失败, 后续不再重试: {:#}", e);
                        None
                    }
                };
                model
            })
            .as_deref()
    }

    /// 翻译整段文本
    ///
    /// 空白文本直接返回空字符串; 翻译能力不可用时返回 `UNAVAILABLE_MARKER`;
    /// 单次推理失败返回 `ERROR_MARKER`, 不影响后续调用
    ///
    /// # 参数
    ///
    /// * `text` - 待翻译文本
    pub fn translate(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let Some(model) = self.model() else {
            warn!("翻译模型不可用");
            return UNAVAILABLE_MARKER.to_string();
        };

        match model.translate(text, self.max_length) {
            Ok(translation) => {
                debug!("翻译完成: {} -> {}", text, translation);
                translation
            }
            Err(e) => {
                error!("翻译失败: {:#}", e);
                ERROR_MARKER.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::{
            Arc, Mutex,
            atomic::AtomicUsize,
            mpsc::{self, Receiver, Sender},
        },
        thread,
        time::Duration,
    };

    use anyhow::{Result, bail};

    use super::*;

    /// 将输入原样加上前缀返回, 输入含 "崩" 时推理失败
    struct EchoModel;

    impl TranslationModel for EchoModel {
        fn translate(&self, text: &str, max_length: usize) -> Result<String> {
            if text.contains('崩') {
                bail!("推理异常");
            }
            Ok(format!("en:{}", text.chars().take(max_length).collect::<String>()))
        }
    }

    #[derive(Default)]
    struct CountingBackend {
        loads: Arc<AtomicUsize>,
        fail: bool,
        delay: Duration,
    }

    impl TranslationBackend for CountingBackend {
        fn load(&self) -> Result<Box<dyn TranslationModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            thread::sleep(self.delay);
            if self.fail {
                bail!("模型文件缺失");
            }
            Ok(Box::new(EchoModel))
        }
    }

    fn translator(fail: bool) -> (Translator, Arc<AtomicUsize>) {
        let loads = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            loads: loads.clone(),
            fail,
            ..Default::default()
        };
        (Translator::new(Some(Box::new(backend)), DEFAULT_MAX_LENGTH), loads)
    }

    #[test]
    fn test_lazy_load_once() {
        let (translator, loads) = translator(false);
        assert_eq!(translator.state(), TranslatorState::Uninitialized);
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        assert_eq!(translator.translate("学中文"), "en:学中文");
        assert_eq!(translator.translate("你好"), "en:你好");
        assert_eq!(translator.state(), TranslatorState::Ready);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_blank_text_does_not_load() {
        let (translator, loads) = translator(false);
        assert_eq!(translator.translate(""), "");
        assert_eq!(translator.translate(" \n\t "), "");
        assert_eq!(translator.state(), TranslatorState::Uninitialized);
        assert_eq!(loads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_not_installed() {
        let translator = Translator::unavailable();
        assert_eq!(translator.state(), TranslatorState::Unavailable);
        assert_eq!(translator.translate("学中文"), UNAVAILABLE_MARKER);
        assert_eq!(translator.translate(""), "");
    }

    #[test]
    fn test_load_failure_is_sticky() {
        let (translator, loads) = translator(true);
        assert_eq!(translator.translate("学中文"), UNAVAILABLE_MARKER);
        assert_eq!(translator.state(), TranslatorState::Unavailable);
        assert_eq!(translator.translate("你好"), UNAVAILABLE_MARKER);
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_inference_failure_is_not_sticky() {
        let (translator, _) = translator(false);
        assert_eq!(translator.translate("崩溃"), ERROR_MARKER);
        assert_eq!(translator.state(), TranslatorState::Ready);
        assert_eq!(translator.translate("学中文"), "en:学中文");
    }

    #[test]
    fn test_max_length_is_passed_to_model() {
        let translator = Translator::new(Some(Box::new(CountingBackend::default())), 2);
        assert_eq!(translator.translate("学中文"), "en:学中");
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let loads = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            loads: loads.clone(),
            fail: false,
            delay: Duration::from_millis(50),
        };
        let translator = Translator::new(Some(Box::new(backend)), DEFAULT_MAX_LENGTH);

        let results: Vec<String> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| translator.translate("学中文")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| r == "en:学中文"));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_use_load_failure() {
        let loads = Arc::new(AtomicUsize::new(0));
        let backend = CountingBackend {
            loads: loads.clone(),
            fail: true,
            delay: Duration::from_millis(50),
        };
        let translator = Translator::new(Some(Box::new(backend)), DEFAULT_MAX_LENGTH);

        let results: Vec<String> = thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| translator.translate("学中文")))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(results.iter().all(|r| r == UNAVAILABLE_MARKER));
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert_eq!(translator.state(), TranslatorState::Unavailable);
    }

    /// 加载时通知测试线程, 并等待放行
    struct GatedBackend {
        started: Mutex<Sender<()>>,
        release: Mutex<Receiver<()>>,
    }

    impl TranslationBackend for GatedBackend {
        fn load(&self) -> Result<Box<dyn TranslationModel>> {
            self.started.lock().unwrap().send(())?;
            self.release.lock().unwrap().recv()?;
            Ok(Box::new(EchoModel))
        }
    }

    #[test]
    fn test_loading_state_is_observable() {
        let (started_tx, started_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel();
        let backend = GatedBackend {
            started: Mutex::new(started_tx),
            release: Mutex::new(release_rx),
        };
        let translator = Translator::new(Some(Box::new(backend)), DEFAULT_MAX_LENGTH);

        thread::scope(|s| {
            let handle = s.spawn(|| translator.translate("学中文"));
            started_rx.recv().unwrap();
            assert_eq!(translator.state(), TranslatorState::Loading);
            release_tx.send(()).unwrap();
            // 加载开始后状态不会回到 Uninitialized
            while !handle.is_finished() {
                assert_ne!(translator.state(), TranslatorState::Uninitialized);
            }
            assert_eq!(handle.join().unwrap(), "en:学中文");
        });
        assert_eq!(translator.state(), TranslatorState::Ready);
    }
}
