/// 长度头部的默认位宽。
/// 头部以无符号整数 (MSB 优先) 记录载荷的字节数，32 位足以覆盖任何实际图像的容量。
pub const DEFAULT_HEADER_BITS: u8 = 32;

/// 长度头部允许的最大位宽。
pub const MAX_HEADER_BITS: u8 = 64;

/// 每个通道默认使用的低位数量。
pub const DEFAULT_BITS_PER_CHANNEL: u8 = 1;

/// 每个通道可使用的最大低位数量 (整个 8 位样本)。
pub const MAX_BITS_PER_CHANNEL: u8 = 8;

/// 一个字节包含的位数。
pub const BITS_PER_BYTE: u64 = 8;

/// 边缘引导策略默认的重要性阈值 (0-255)。
pub const DEFAULT_EDGE_THRESHOLD: u8 = 100;

/// 未指定输出路径时，隐写结果图像文件名的前缀。
pub const DOCTORED_PREFIX: &str = "doctored_";

/// 未指定输出路径时，恢复载荷文件名的前缀。
pub const RECOVERED_PREFIX: &str = "recovered_";
