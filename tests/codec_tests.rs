use lsb_stego::analyzer::{Analyzer, LsbAnalyzer};
use lsb_stego::codec::{Codec, EdgeGuidedCodec, LsbCodec};
use lsb_stego::framer::Framer;
use lsb_stego::pixels::{Layout, StegoImage};
use lsb_stego::policy::{Channel, ChannelPolicy};
use lsb_stego::steganography::{embed, embed_with, extract, extract_text, extract_with};
use lsb_stego::traversal::{self, BitPosition};
use lsb_stego::StegoError;
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};

/// 生成确定性的随机像素图像
fn random_image(width: u32, height: u32, layout: Layout, seed: u64) -> StegoImage {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut samples = vec![0u8; width as usize * height as usize * layout.channel_count()];
    rng.fill_bytes(&mut samples);
    StegoImage::new(width, height, layout, samples).expect("valid buffer")
}

fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut payload = vec![0u8; len];
    rng.fill_bytes(&mut payload);
    payload
}

/// 4x4 全零图像、RGB 1 位、8 位头部，嵌入单字节 'A'
#[test]
fn test_single_byte_scenario_on_blank_image() {
    let mut image = StegoImage::blank(4, 4, Layout::Rgb);
    let original = image.clone();
    let policy = ChannelPolicy::default();
    let codec = LsbCodec::new(policy.clone());
    let framer = Framer::new(8).unwrap();

    assert_eq!(traversal::capacity(4, 4, &policy), 48);

    let report = embed_with(&codec, &framer, &mut image, &[0x41]).unwrap();
    assert_eq!(report.frame_bits, 16);
    assert_eq!(report.capacity, 48);
    assert_eq!(report.touched, 16);

    // 头部 00000001 与载荷 01000001 中的 1 位分别落在第 7、9、15 个样本
    let differing: Vec<usize> = original
        .samples()
        .iter()
        .zip(image.samples())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(differing, vec![7, 9, 15]);
    assert_eq!(report.changed, 3);
    assert!(image.samples().iter().all(|&v| v <= 1));

    let recovered = extract_with(&codec, &framer, &image).unwrap();
    assert_eq!(recovered, b"A");
}

#[test]
fn test_round_trip_across_policies() {
    let policies = [
        ChannelPolicy::default(),
        ChannelPolicy::rgb(2).unwrap(),
        ChannelPolicy::rgb(8).unwrap(),
        ChannelPolicy::new(vec![Channel::Blue, Channel::Red], 3).unwrap(),
        ChannelPolicy::new(vec![Channel::Green], 1).unwrap(),
        ChannelPolicy::new(
            vec![Channel::Alpha, Channel::Red, Channel::Green, Channel::Blue],
            4,
        )
        .unwrap(),
    ];

    for (i, policy) in policies.iter().enumerate() {
        let mut image = random_image(40, 30, Layout::Rgba, i as u64);
        let original = image.clone();
        let payload = random_payload(100, 1000 + i as u64);

        embed(&mut image, &payload, policy).unwrap();
        assert_eq!(extract(&image, policy).unwrap(), payload, "policy {policy}");

        // 只有策略通道的可用低位会改变
        let mask = !policy.low_bits_mask();
        for pixel in 0..image.pixel_count() {
            for &channel in Layout::Rgba.channels() {
                let before = original.sample(pixel, channel).unwrap();
                let after = image.sample(pixel, channel).unwrap();
                if policy.channels().contains(&channel) {
                    assert_eq!(before & mask, after & mask);
                } else {
                    assert_eq!(before, after);
                }
            }
        }
    }
}

#[test]
fn test_empty_payload_round_trip() {
    let mut image = random_image(8, 8, Layout::Rgb, 7);
    let policy = ChannelPolicy::default();

    let report = embed(&mut image, &[], &policy).unwrap();
    assert_eq!(report.frame_bits, 32);
    assert_eq!(extract(&image, &policy).unwrap(), Vec::<u8>::new());
}

#[test]
fn test_capacity_boundary_is_exact() {
    // 4x4 RGB 1 位 = 48 位；32 位头部后恰好能放 2 个字节
    let policy = ChannelPolicy::default();

    let mut exact = random_image(4, 4, Layout::Rgb, 11);
    embed(&mut exact, b"ok", &policy).unwrap();
    assert_eq!(extract(&exact, &policy).unwrap(), b"ok");

    let mut too_small = random_image(4, 4, Layout::Rgb, 11);
    let untouched = too_small.clone();
    let err = embed(&mut too_small, b"oki", &policy).unwrap_err();
    assert_eq!(
        err,
        StegoError::InsufficientCapacity {
            required: 56,
            available: 48
        }
    );
    assert_eq!(too_small, untouched, "failed embed must not mutate the image");
}

#[test]
fn test_touched_values_match_frame_length() {
    let framer = Framer::default();
    for bits_per_channel in 1..=8u8 {
        let policy = ChannelPolicy::rgb(bits_per_channel).unwrap();
        let mut image = random_image(16, 16, Layout::Rgb, u64::from(bits_per_channel));
        let original = image.clone();
        let payload = random_payload(5, 99);

        let report = embed(&mut image, &payload, &policy).unwrap();
        let expected = report.frame_bits.div_ceil(u64::from(bits_per_channel)) as usize;
        assert_eq!(report.frame_bits, 32 + 8 * 5);
        assert_eq!(report.touched, expected);

        // 帧之后的样本与原图完全一致
        assert_eq!(
            &image.samples()[expected..],
            &original.samples()[expected..]
        );
        let differing = original
            .samples()
            .iter()
            .zip(image.samples())
            .filter(|(a, b)| a != b)
            .count();
        assert_eq!(differing, report.changed);
        assert!(report.changed <= report.touched);

        assert_eq!(extract_with(&LsbCodec::new(policy), &framer, &image).unwrap(), payload);
    }
}

#[test]
fn test_positions_order_and_determinism() {
    let policy = ChannelPolicy::new(vec![Channel::Blue, Channel::Red], 2).unwrap();
    let first: Vec<BitPosition> = traversal::positions(3, 2, &policy).collect();
    let second: Vec<BitPosition> = traversal::positions(3, 2, &policy).collect();
    assert_eq!(first, second);
    assert_eq!(first.len() as u64, traversal::capacity(3, 2, &policy));

    let head: Vec<(usize, Channel, u8)> = first
        .iter()
        .take(5)
        .map(|p| (p.pixel_index, p.channel, p.bit_offset))
        .collect();
    assert_eq!(
        head,
        vec![
            (0, Channel::Blue, 1),
            (0, Channel::Blue, 0),
            (0, Channel::Red, 1),
            (0, Channel::Red, 0),
            (1, Channel::Blue, 1),
        ]
    );
    assert_eq!(first.last().map(|p| p.pixel_index), Some(5));

    // 克隆得到的迭代器可以独立重放
    let iter = traversal::positions(3, 2, &policy);
    assert!(iter.clone().eq(iter));
}

#[test]
fn test_positions_in_follows_given_pixel_order() {
    let policy = ChannelPolicy::default();
    let pixels: Vec<usize> = traversal::positions_in(vec![4, 1], &policy)
        .map(|p| p.pixel_index)
        .collect();
    assert_eq!(pixels, vec![4, 4, 4, 1, 1, 1]);
    assert_eq!(traversal::capacity_for(2, &policy), 6);
}

#[test]
fn test_frame_bits_are_msb_first() {
    let framer = Framer::new(8).unwrap();
    let bits = framer.frame(&[0x41]).unwrap();
    let rendered: String = bits.iter().map(|&b| if b { '1' } else { '0' }).collect();
    assert_eq!(rendered, "0000000101000001");
    assert_eq!(framer.unframe(bits).unwrap(), vec![0x41]);
}

#[test]
fn test_frame_rejects_payload_beyond_header_range() {
    let framer = Framer::new(8).unwrap();
    assert_eq!(framer.max_payload_len(), 255);
    assert!(framer.frame(&[0u8; 255]).is_ok());
    assert_eq!(
        framer.frame(&[0u8; 256]).unwrap_err(),
        StegoError::PayloadTooLarge {
            len: 256,
            header_bits: 8,
            max: 255
        }
    );

    assert_eq!(Framer::new(64).unwrap().max_payload_len(), u64::MAX);
    assert_eq!(Framer::new(0).unwrap_err(), StegoError::InvalidHeaderWidth(0));
    assert_eq!(Framer::new(65).unwrap_err(), StegoError::InvalidHeaderWidth(65));
}

#[test]
fn test_unframe_reports_truncation() {
    let framer = Framer::new(8).unwrap();
    let mut bits = framer.frame(b"hello").unwrap();
    bits.truncate(8 + 8 * 3 + 4);
    assert_eq!(
        framer.unframe(bits).unwrap_err(),
        StegoError::TruncatedStream {
            needed: 48,
            available: 36
        }
    );

    assert_eq!(
        framer.unframe(vec![true; 5]).unwrap_err(),
        StegoError::TruncatedStream {
            needed: 8,
            available: 5
        }
    );
}

#[test]
fn test_unframe_consumes_only_the_frame() {
    let framer = Framer::default();
    let mut bits = framer.frame(b"xy").unwrap();
    bits.extend([true, false, true]);

    let mut stream = bits.into_iter();
    assert_eq!(framer.unframe(stream.by_ref()).unwrap(), b"xy");
    assert_eq!(stream.collect::<Vec<_>>(), vec![true, false, true]);
}

#[test]
fn test_extract_rejects_implausible_header() {
    let policy = ChannelPolicy::default();
    let mut image = StegoImage::blank(10, 10, Layout::Rgb);
    // 头部 32 位全为 1，声明的长度远超 300 位容量
    for pos in traversal::positions(10, 10, &policy).take(32) {
        *image.sample_mut(pos.pixel_index, pos.channel).unwrap() = 1;
    }

    match extract(&image, &policy) {
        Err(StegoError::NoHiddenMessage(reason)) => assert!(reason.contains("declares")),
        other => panic!("expected NoHiddenMessage, got {other:?}"),
    }
}

#[test]
fn test_extract_on_image_smaller_than_header() {
    let image = StegoImage::blank(2, 2, Layout::Rgb);
    let err = extract(&image, &ChannelPolicy::default()).unwrap_err();
    assert!(matches!(err, StegoError::NoHiddenMessage(_)));
}

#[test]
fn test_extract_on_unmodified_random_image() {
    let image = random_image(64, 64, Layout::Rgb, 2024);
    let err = extract(&image, &ChannelPolicy::default()).unwrap_err();
    assert!(matches!(err, StegoError::NoHiddenMessage(_)));
}

#[test]
fn test_short_message_in_large_image() {
    let mut image = random_image(512, 512, Layout::Rgb, 5);
    let policy = ChannelPolicy::default();
    embed(&mut image, b"tiny", &policy).unwrap();
    assert_eq!(extract(&image, &policy).unwrap(), b"tiny");
}

#[test]
fn test_extract_text_flags_invalid_utf8() {
    let codec = LsbCodec::default();
    let framer = Framer::default();

    let mut text_image = random_image(20, 20, Layout::Rgb, 3);
    embed_with(&codec, &framer, &mut text_image, "隐写 text".as_bytes()).unwrap();
    assert_eq!(extract_text(&codec, &framer, &text_image).unwrap(), "隐写 text");

    let mut binary_image = random_image(20, 20, Layout::Rgb, 3);
    embed_with(&codec, &framer, &mut binary_image, &[0xff, 0xfe, 0x00]).unwrap();
    let err = extract_text(&codec, &framer, &binary_image).unwrap_err();
    assert!(matches!(err, StegoError::CorruptedMessage(_)));
}

#[test]
fn test_policy_validation() {
    assert!(matches!(
        ChannelPolicy::rgb(0),
        Err(StegoError::InvalidPolicy(_))
    ));
    assert!(matches!(
        ChannelPolicy::rgb(9),
        Err(StegoError::InvalidPolicy(_))
    ));
    assert!(matches!(
        ChannelPolicy::new(vec![], 1),
        Err(StegoError::InvalidPolicy(_))
    ));
    assert!(matches!(
        ChannelPolicy::new(vec![Channel::Red, Channel::Red], 1),
        Err(StegoError::InvalidPolicy(_))
    ));

    assert_eq!("G".parse::<Channel>().unwrap(), Channel::Green);
    assert_eq!("alpha".parse::<Channel>().unwrap(), Channel::Alpha);
    assert!("x".parse::<Channel>().is_err());
    assert_eq!(ChannelPolicy::rgb(3).unwrap().low_bits_mask(), 0b111);
    assert_eq!(ChannelPolicy::rgb(8).unwrap().low_bits_mask(), 0xff);
}

#[test]
fn test_alpha_policy_on_rgb_image_is_rejected_before_mutation() {
    let mut image = random_image(10, 10, Layout::Rgb, 8);
    let untouched = image.clone();
    let policy = ChannelPolicy::new(vec![Channel::Red, Channel::Alpha], 1).unwrap();

    let err = embed(&mut image, b"a", &policy).unwrap_err();
    assert_eq!(
        err,
        StegoError::UnsupportedChannel {
            channel: Channel::Alpha,
            layout: Layout::Rgb
        }
    );
    assert_eq!(image, untouched);
}

#[test]
fn test_buffer_length_is_validated() {
    let err = StegoImage::new(2, 2, Layout::Rgba, vec![0; 12]).unwrap_err();
    assert_eq!(
        err,
        StegoError::BufferSize {
            expected: 16,
            actual: 12
        }
    );
}

#[test]
fn test_dynamic_image_conversion_keeps_samples() {
    let image = random_image(6, 5, Layout::Rgba, 21);
    let dynamic = image.clone().into_dynamic().unwrap();
    assert_eq!(StegoImage::from_dynamic(dynamic), image);

    let gray = image::DynamicImage::ImageLuma8(image::GrayImage::new(3, 3));
    let converted = StegoImage::from_dynamic(gray);
    assert_eq!(converted.layout(), Layout::Rgb);
    assert_eq!(converted.samples().len(), 27);
}

#[test]
fn test_edge_guided_round_trip() {
    let policy = ChannelPolicy::default();
    let codec = EdgeGuidedCodec::new(policy.clone(), 100);
    let framer = Framer::default();
    let mut image = random_image(48, 48, Layout::Rgb, 77);
    let original = image.clone();

    let order_before = codec.pixel_order(&image).unwrap();
    let capacity = codec.capacity(&image).unwrap();
    assert!(!order_before.is_empty());
    assert!(capacity < traversal::capacity(48, 48, &policy));
    assert_eq!(capacity, order_before.len() as u64 * 3);

    let payload = b"edge guided payload";
    embed_with(&codec, &framer, &mut image, payload).unwrap();

    assert_eq!(codec.pixel_order(&image).unwrap(), order_before);
    assert_eq!(extract_with(&codec, &framer, &image).unwrap(), payload);

    // 未被选中的像素保持原样
    let mut selected = vec![false; image.pixel_count()];
    for &p in &order_before {
        selected[p] = true;
    }
    for pixel in (0..image.pixel_count()).filter(|&p| !selected[p]) {
        for &channel in Layout::Rgb.channels() {
            assert_eq!(image.sample(pixel, channel), original.sample(pixel, channel));
        }
    }
}

#[test]
fn test_edge_guided_flat_image_has_no_capacity() {
    let mut image = StegoImage::blank(16, 16, Layout::Rgb);
    let codec = EdgeGuidedCodec::new(ChannelPolicy::default(), 1);
    assert_eq!(codec.capacity(&image).unwrap(), 0);

    let err = embed_with(&codec, &Framer::default(), &mut image, b"x").unwrap_err();
    assert!(matches!(err, StegoError::InsufficientCapacity { .. }));
}

#[test]
fn test_codecs_are_interchangeable_behind_trait_objects() {
    let codecs: Vec<Box<dyn Codec>> = vec![
        Box::new(LsbCodec::new(ChannelPolicy::rgb(2).unwrap())),
        Box::new(EdgeGuidedCodec::new(ChannelPolicy::default(), 50)),
    ];
    let framer = Framer::new(16).unwrap();

    for (i, codec) in codecs.iter().enumerate() {
        let mut image = random_image(40, 40, Layout::Rgba, 300 + i as u64);
        embed_with(codec.as_ref(), &framer, &mut image, b"shared frame").unwrap();
        assert_eq!(
            extract_with(codec.as_ref(), &framer, &image).unwrap(),
            b"shared frame"
        );
    }
}

#[test]
fn test_analyzer_detects_embedded_text() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut image = random_image(64, 64, Layout::Rgb, 42);
    let message: String = (0..200)
        .map(|_| char::from(rng.random_range(b'a'..=b'z')))
        .collect();
    embed(&mut image, message.as_bytes(), &ChannelPolicy::default()).unwrap();

    let analyzer = LsbAnalyzer::default();
    let analysis = analyzer.analyze(&image);
    let best = analysis.best_probe().expect("a plausible header");
    assert_eq!(best.policy, ChannelPolicy::default());
    assert_eq!(best.payload_len, Some(200));
    assert!(best.is_text);
    assert!(analyzer.score(&image) >= 0.95);
}

#[test]
fn test_analyzer_scores_blank_image_low() {
    let image = StegoImage::blank(32, 32, Layout::Rgba);
    let analysis = LsbAnalyzer::default().analyze(&image);

    // RGBA 图像会额外探测 alpha 通道
    assert_eq!(analysis.probes.len(), 4);
    assert_eq!(analysis.pair_balance, 0.0);
    assert!(analysis.likelihood < 0.75);
}
