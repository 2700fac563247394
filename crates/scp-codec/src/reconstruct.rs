//! 波形重建.
//!
//! 将段 5 (参考心搏) 与段 6 (节律数据) 的压缩字节还原为每个导联的采样序列:
//! - 参考心搏: 每个导联解码 `1000 × 时长(ms) / 采样间隔(µs)` 个采样
//! - 节律数据: 按抽取因子做采样保持, 保护区内不抽取
//! - 减除区: 在节律采样上叠加对应位置的参考心搏采样
//!
//! 导联之间不共享可变状态, 可以顺序解码, 也可以用 rayon 并行解码,
//! 两种方式的输出完全一致.

use bytes::Bytes;
use log::{debug, warn};
use rayon::prelude::*;
use scp_core::{DecodeWarning, ScpError, ScpResult};

use crate::huffman::{DecoderConfig, DifferenceMode, HuffmanDecoder, HuffmanTables};

/// 采样区间 (从 1 开始, 首尾均包含)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRange {
    /// 起始采样
    pub start: u32,
    /// 结束采样
    pub end: u32,
}

impl SampleRange {
    /// 创建采样区间
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// 采样序号是否落在区间内
    pub fn contains(&self, index: u32) -> bool {
        self.start <= index && index <= self.end
    }
}

/// 参考心搏减除区
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubtractionZone {
    /// 心搏类型
    pub beat_type: u16,
    /// 起始采样
    pub start: u32,
    /// 该心搏的基准点
    pub fiducial: u32,
    /// 结束采样
    pub end: u32,
}

impl SubtractionZone {
    /// 采样序号是否落在减除区内
    pub fn contains(&self, index: u32) -> bool {
        self.start <= index && index <= self.end
    }

    /// 节律采样 `index` 对应的参考心搏偏移 (从 1 开始)
    pub fn reference_offset(&self, reference_fiducial: u16, index: u32) -> i64 {
        i64::from(reference_fiducial) - (i64::from(self.fiducial) - i64::from(self.start))
            + (i64::from(index) - i64::from(self.start))
    }
}

/// 段 4 给出的心搏几何信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeatGeometry {
    /// 参考心搏时长 (毫秒)
    pub reference_beat_duration_ms: u16,
    /// 参考心搏内的基准点 (采样序号)
    pub fiducial: u16,
    /// 减除区列表
    pub subtraction_zones: Vec<SubtractionZone>,
    /// 保护区列表
    pub protected_areas: Vec<SampleRange>,
}

/// 段 5/6 的压缩导联数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedLeads {
    /// 幅度倍率 (纳伏)
    pub amplitude_multiplier_nv: u16,
    /// 采样间隔 (微秒)
    pub sample_interval_us: u16,
    /// 差分编码模式
    pub difference_mode: DifferenceMode,
    /// 每个导联的压缩字节
    pub leads: Vec<Bytes>,
}

impl EncodedLeads {
    fn config(&self) -> DecoderConfig {
        DecoderConfig::new(
            i32::from(self.amplitude_multiplier_nv),
            self.difference_mode,
        )
    }

    fn lead_bytes(&self, lead: usize) -> &[u8] {
        self.leads.get(lead).map(|b| b.as_ref()).unwrap_or(&[])
    }
}

/// 出错导联所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadStage {
    /// 参考心搏 (段 5)
    ReferenceBeat,
    /// 节律数据 (段 6)
    Rhythm,
}

/// 单个导联的解码错误, 不影响其他导联
#[derive(Debug)]
pub struct LeadError {
    /// 导联序号 (段 3 顺序, 从 0 开始)
    pub lead: usize,
    /// 出错阶段
    pub stage: LeadStage,
    /// 错误
    pub error: ScpError,
}

/// 重建结果
#[derive(Debug, Default)]
pub struct Reconstruction {
    /// 每个导联的节律采样; 解码失败的导联为空
    pub lead_samples: Vec<Vec<i16>>,
    /// 每个导联的参考心搏采样; 解码失败的导联为空
    pub reference_beats: Vec<Vec<i16>>,
    /// 导联级错误
    pub lead_errors: Vec<LeadError>,
    /// 重建过程中的告警
    pub warnings: Vec<DecodeWarning>,
    /// 节律数据的抽取因子 (1 表示未抽取)
    pub decimation_factor: u32,
    /// 输出采样对应的采样间隔 (微秒)
    pub sample_interval_us: u32,
}

/// 单个导联的重建输出
struct LeadOutcome {
    samples: ScpResult<Vec<i16>>,
    warnings: Vec<DecodeWarning>,
}

impl LeadOutcome {
    fn failed(error: ScpError) -> Self {
        Self {
            samples: Err(error),
            warnings: Vec::new(),
        }
    }
}

/// 波形重建器
///
/// # 示例
/// ```
/// use bytes::Bytes;
/// use scp_codec::huffman::{DifferenceMode, HuffmanTables};
/// use scp_codec::reconstruct::{EncodedLeads, Reconstructor};
///
/// // 默认码表: "0" -> 0, "100" -> 1, "101" -> -1
/// let rhythm = EncodedLeads {
///     amplitude_multiplier_nv: 1000,
///     sample_interval_us: 2000,
///     difference_mode: DifferenceMode::Absolute,
///     leads: vec![Bytes::from_static(&[0b0100_1010])],
/// };
/// let tables = HuffmanTables::Default;
/// let result = Reconstructor::new(&tables, vec![3])
///     .with_rhythm(&rhythm)
///     .run()
///     .unwrap();
/// assert_eq!(result.lead_samples, vec![vec![0, 1, -1]]);
/// ```
pub struct Reconstructor<'a> {
    tables: &'a HuffmanTables,
    sample_counts: Vec<usize>,
    geometry: Option<&'a BeatGeometry>,
    reference: Option<&'a EncodedLeads>,
    rhythm: Option<&'a EncodedLeads>,
    parallel: bool,
}

impl<'a> Reconstructor<'a> {
    /// 创建重建器, `sample_counts` 为段 3 中每个导联的采样数
    pub fn new(tables: &'a HuffmanTables, sample_counts: Vec<usize>) -> Self {
        Self {
            tables,
            sample_counts,
            geometry: None,
            reference: None,
            rhythm: None,
            parallel: false,
        }
    }

    /// 设置段 4 心搏几何信息
    pub fn with_geometry(mut self, geometry: &'a BeatGeometry) -> Self {
        self.geometry = Some(geometry);
        self
    }

    /// 设置段 5 参考心搏数据
    pub fn with_reference(mut self, reference: &'a EncodedLeads) -> Self {
        self.reference = Some(reference);
        self
    }

    /// 设置段 6 节律数据
    pub fn with_rhythm(mut self, rhythm: &'a EncodedLeads) -> Self {
        self.rhythm = Some(rhythm);
        self
    }

    /// 是否并行解码各导联
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// 导联数
    pub fn lead_count(&self) -> usize {
        self.sample_counts.len()
    }

    /// 执行重建
    ///
    /// 存在参考心搏但缺少段 4, 或参考心搏采样数无法计算时返回错误;
    /// 单个导联的 Huffman 错误只记录在 [`Reconstruction::lead_errors`] 中.
    pub fn run(&self) -> ScpResult<Reconstruction> {
        let mut result = Reconstruction {
            decimation_factor: 1,
            ..Default::default()
        };

        if let Some(reference) = self.reference {
            let geometry = self.geometry.ok_or(ScpError::MissingSection(4))?;
            let count = reference_sample_count(geometry, reference)?;
            debug!(
                "解码参考心搏: {} 个导联, 每导联 {} 个采样",
                self.lead_count(),
                count
            );
            let outcomes =
                self.for_each_lead(|lead| self.decode_reference_lead(reference, lead, count));
            let beats = collect_outcomes(outcomes, LeadStage::ReferenceBeat, &mut result);
            result.reference_beats = beats;
        }

        if let Some(rhythm) = self.rhythm {
            let factor = self.decimation_factor(rhythm);
            result.decimation_factor = factor;
            result.sample_interval_us = match self.reference {
                Some(reference) if factor > 1 => u32::from(reference.sample_interval_us),
                _ => u32::from(rhythm.sample_interval_us),
            };
            debug!(
                "解码节律数据: {} 个导联, 抽取因子 {}",
                self.lead_count(),
                factor
            );
            let reference_beats = &result.reference_beats;
            let outcomes = self.for_each_lead(|lead| {
                self.decode_rhythm_lead(rhythm, lead, factor, reference_beats.get(lead))
            });
            let samples = collect_outcomes(outcomes, LeadStage::Rhythm, &mut result);
            result.lead_samples = samples;
        } else if let Some(reference) = self.reference {
            result.sample_interval_us = u32::from(reference.sample_interval_us);
        }

        Ok(result)
    }

    /// 逐导联执行, 结果按导联顺序排列
    fn for_each_lead<F>(&self, f: F) -> Vec<LeadOutcome>
    where
        F: Fn(usize) -> LeadOutcome + Sync + Send,
    {
        let leads = 0..self.lead_count();
        if self.parallel {
            leads.into_par_iter().map(&f).collect()
        } else {
            leads.map(&f).collect()
        }
    }

    fn decode_reference_lead(
        &self,
        reference: &EncodedLeads,
        lead: usize,
        count: usize,
    ) -> LeadOutcome {
        let samples = HuffmanDecoder::new(reference.lead_bytes(lead), self.tables, reference.config())
            .and_then(|mut decoder| decoder.decode_n(count));
        LeadOutcome {
            samples,
            warnings: Vec::new(),
        }
    }

    fn decode_rhythm_lead(
        &self,
        rhythm: &EncodedLeads,
        lead: usize,
        factor: u32,
        reference_beat: Option<&Vec<i16>>,
    ) -> LeadOutcome {
        let count = self.sample_counts[lead];
        let mut decoder =
            match HuffmanDecoder::new(rhythm.lead_bytes(lead), self.tables, rhythm.config()) {
                Ok(decoder) => decoder,
                Err(error) => return LeadOutcome::failed(error),
            };

        // 参考心搏解码失败时不做叠加
        let reference_beat = reference_beat.filter(|beat| !beat.is_empty());
        let (zones, fiducial) = match self.geometry {
            Some(geometry) => (geometry.subtraction_zones.as_slice(), geometry.fiducial),
            None => (&[][..], 0),
        };
        let mut out_of_range = vec![0usize; zones.len()];

        // 采样数来自段 3, 不按它预分配, 位流耗尽时尽早返回
        let mut held = 0i16;
        let mut samples = Vec::new();
        for (pos, is_fresh) in self.hold_plan(count, factor).enumerate() {
            let index = (pos + 1) as u32;
            if is_fresh {
                held = match decoder.decode_one() {
                    Ok(value) => value,
                    Err(error) => return LeadOutcome::failed(error),
                };
            }
            let mut sample = held;

            let zone = zones.iter().enumerate().find(|(_, z)| z.contains(index));
            if let (Some(beat), Some((zone_idx, zone))) = (reference_beat, zone) {
                let offset = zone.reference_offset(fiducial, index);
                match usize::try_from(offset - 1).ok().and_then(|p| beat.get(p)) {
                    Some(r) => sample = sample.wrapping_add(*r),
                    None => out_of_range[zone_idx] += 1,
                }
            }
            samples.push(sample);
        }

        let warnings = out_of_range
            .into_iter()
            .enumerate()
            .filter(|(_, n)| *n > 0)
            .map(|(zone, samples)| DecodeWarning::ReferenceOffsetOutOfRange {
                lead,
                zone,
                samples,
            })
            .collect();

        LeadOutcome {
            samples: Ok(samples),
            warnings,
        }
    }

    /// 节律数据的抽取因子
    fn decimation_factor(&self, rhythm: &EncodedLeads) -> u32 {
        match self.reference {
            Some(reference) if reference.sample_interval_us > 0 => {
                (u32::from(rhythm.sample_interval_us) / u32::from(reference.sample_interval_us))
                    .max(1)
            }
            _ => 1,
        }
    }

    /// 每个采样位置是取新值 (true) 还是保持上一个值 (false)
    fn hold_plan(&self, count: usize, factor: u32) -> HoldPlan<'_> {
        HoldPlan {
            protected: self
                .geometry
                .map(|g| g.protected_areas.as_slice())
                .unwrap_or(&[]),
            factor,
            counter: 0,
            pos: 0,
            count,
        }
    }
}

/// 抽取还原的逐位置取值计划
///
/// 保护区内每个位置都取新值并把计数器清零; 其余位置每 `factor` 个取一次新值.
struct HoldPlan<'a> {
    protected: &'a [SampleRange],
    factor: u32,
    counter: u32,
    pos: usize,
    count: usize,
}

impl Iterator for HoldPlan<'_> {
    type Item = bool;

    fn next(&mut self) -> Option<bool> {
        if self.pos >= self.count {
            return None;
        }
        self.pos += 1;
        let index = self.pos as u32;

        if self.protected.iter().any(|area| area.contains(index)) {
            self.counter = 0;
            return Some(true);
        }
        if self.factor <= 1 {
            return Some(true);
        }
        let fresh = self.counter == 0;
        self.counter += 1;
        if self.counter >= self.factor {
            self.counter = 0;
        }
        Some(fresh)
    }
}

/// 参考心搏的采样数
fn reference_sample_count(geometry: &BeatGeometry, reference: &EncodedLeads) -> ScpResult<usize> {
    if reference.sample_interval_us == 0 {
        return Err(ScpError::SampleCount("参考心搏采样间隔为 0".into()));
    }
    let count = 1000 * u64::from(geometry.reference_beat_duration_ms)
        / u64::from(reference.sample_interval_us);
    usize::try_from(count).map_err(|_| ScpError::SampleCount(format!("采样数溢出: {}", count)))
}

/// 按导联顺序汇总输出, 失败的导联记为空序列
fn collect_outcomes(
    outcomes: Vec<LeadOutcome>,
    stage: LeadStage,
    result: &mut Reconstruction,
) -> Vec<Vec<i16>> {
    let mut leads = Vec::with_capacity(outcomes.len());
    for (lead, outcome) in outcomes.into_iter().enumerate() {
        for warning in outcome.warnings {
            warn!("{}", warning);
            result.warnings.push(warning);
        }
        match outcome.samples {
            Ok(samples) => leads.push(samples),
            Err(error) => {
                warn!("导联 {} 解码失败 ({:?}): {}", lead, stage, error);
                result.lead_errors.push(LeadError { lead, stage, error });
                leads.push(Vec::new());
            }
        }
    }
    leads
}
