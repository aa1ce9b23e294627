//! # 隐写分析
//!
//! 在不知道嵌入策略的情况下，估计图像包含隐藏数据的可能性。
//! 两类证据：
//!
//! * 头部探测：用若干常见策略读取长度头部，检查声明的长度是否落在容量之内；
//! * 值对平衡：LSB 嵌入会使直方图中 `2k` 与 `2k+1` 两个值的计数趋于相等。

use log::debug;

use crate::codec::LsbCodec;
use crate::error::StegoError;
use crate::framer::Framer;
use crate::pixels::{Layout, StegoImage};
use crate::policy::{Channel, ChannelPolicy};
use crate::steganography::extract_with;

/// 为图像打分的分析器，分数在 0.0..=1.0 之间。
pub trait Analyzer {
    fn score(&self, image: &StegoImage) -> f64;
}

/// 单个候选策略的头部探测结果。
#[derive(Debug, Clone, PartialEq)]
pub struct Probe {
    pub policy: ChannelPolicy,
    /// 成功提取时的载荷长度。
    pub payload_len: Option<usize>,
    /// 载荷是否为合法 UTF-8 文本。
    pub is_text: bool,
}

impl Probe {
    pub fn plausible(&self) -> bool {
        self.payload_len.is_some()
    }
}

/// 分析报告。
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    pub probes: Vec<Probe>,
    /// 值对平衡度，1.0 表示各值对计数完全相等。
    pub pair_balance: f64,
    pub likelihood: f64,
}

impl Analysis {
    /// 第一个头部看似有效的策略。
    pub fn best_probe(&self) -> Option<&Probe> {
        self.probes.iter().find(|p| p.plausible())
    }
}

/// 基于头部探测与值对平衡的 LSB 分析器。
#[derive(Debug, Clone)]
pub struct LsbAnalyzer {
    framer: Framer,
    candidates: Vec<ChannelPolicy>,
}

impl LsbAnalyzer {
    pub fn new(framer: Framer, candidates: Vec<ChannelPolicy>) -> Self {
        Self { framer, candidates }
    }

    pub fn analyze(&self, image: &StegoImage) -> Analysis {
        let probes: Vec<Probe> = self
            .candidates
            .iter()
            .filter(|policy| image.ensure_supports(policy).is_ok())
            .map(|policy| self.probe(image, policy))
            .collect();

        let pair_balance = pair_balance(image);
        let header_evidence = probes
            .iter()
            .filter(|p| p.plausible() && p.payload_len != Some(0))
            .map(|p| if p.is_text { 0.95 } else { 0.75 })
            .fold(0.0, f64::max);
        // 自然噪声同样会使值对平衡，单凭这一项不足以判定。
        let likelihood = header_evidence.max(pair_balance * 0.5);

        debug!(
            "Analysis: {} plausible header(s), pair balance {pair_balance:.3}, likelihood {likelihood:.3}",
            probes.iter().filter(|p| p.plausible()).count()
        );

        Analysis {
            probes,
            pair_balance,
            likelihood,
        }
    }

    fn probe(&self, image: &StegoImage, policy: &ChannelPolicy) -> Probe {
        let codec = LsbCodec::new(policy.clone());
        match extract_with(&codec, &self.framer, image) {
            Ok(payload) => Probe {
                policy: policy.clone(),
                payload_len: Some(payload.len()),
                is_text: std::str::from_utf8(&payload).is_ok(),
            },
            Err(e) => {
                if !matches!(e, StegoError::NoHiddenMessage(_)) {
                    debug!("Probe with {policy} failed: {e}");
                }
                Probe {
                    policy: policy.clone(),
                    payload_len: None,
                    is_text: false,
                }
            }
        }
    }
}

impl Default for LsbAnalyzer {
    /// RGB/1、RGB/2、R/1 与 RGBA/1 四个候选策略。
    fn default() -> Self {
        let mut candidates = vec![ChannelPolicy::default()];
        candidates.extend(ChannelPolicy::rgb(2));
        candidates.extend(ChannelPolicy::new(vec![Channel::Red], 1));
        candidates.extend(ChannelPolicy::new(Layout::Rgba.channels().to_vec(), 1));
        Self::new(Framer::default(), candidates)
    }
}

impl Analyzer for LsbAnalyzer {
    fn score(&self, image: &StegoImage) -> f64 {
        self.analyze(image).likelihood
    }
}

/// 所有 R、G、B 样本直方图中值对 `(2k, 2k+1)` 的平衡度。
pub fn pair_balance(image: &StegoImage) -> f64 {
    let mut histogram = [0u64; 256];
    let stride = image.layout().channel_count();
    for pixel in image.samples().chunks_exact(stride) {
        for &value in &pixel[..3] {
            histogram[usize::from(value)] += 1;
        }
    }

    let (diff, total) = histogram
        .chunks_exact(2)
        .fold((0u64, 0u64), |(diff, total), pair| {
            (diff + pair[0].abs_diff(pair[1]), total + pair[0] + pair[1])
        });
    if total == 0 {
        return 0.0;
    }
    1.0 - diff as f64 / total as f64
}
