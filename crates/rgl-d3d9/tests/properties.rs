use proptest::prelude::*;
use rgl_d3d9::{
    blit_image, blit_region, draw_pitched_pixels, normalize_dimensions, pack_pixel, BlitConfig,
    Channel, D3DFormat, GenericPacker, Kernel, MemorySurface, PitchedImage, PixelBuffer,
    PixelFormatDescriptor, Rect, SourceDepth, SourceFormat, SourceImage, TextureConstraints,
    CONVERTIBLE_FORMATS,
};

/// Formats the generic packer can store (16 or 32 bits per pixel).
fn packable_format() -> impl Strategy<Value = PixelFormatDescriptor> {
    let packable: Vec<_> = CONVERTIBLE_FORMATS
        .into_iter()
        .map(PixelFormatDescriptor::resolve)
        .filter(|desc| matches!(desc.bytes_per_pixel, 2 | 4))
        .collect();
    proptest::sample::select(packable)
}

/// Source samples of the given depth, as `[R, G, B, A]`.
fn samples(depth: SourceDepth) -> impl Strategy<Value = [u32; 4]> {
    let max = (1u32 << depth.bits()) - 1;
    [0..=max, 0..=max, 0..=max, 0..=max]
}

fn source_depth() -> impl Strategy<Value = SourceDepth> {
    prop_oneof![Just(SourceDepth::Bits8), Just(SourceDepth::Bits4)]
}

#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Above,
    Below,
}

/// A destination size plus a non-degenerate rectangle lying entirely past one of its edges.
fn outside_rect() -> impl Strategy<Value = (u32, u32, Rect, Side)> {
    (
        1u32..64,
        1u32..64,
        prop_oneof![
            Just(Side::Left),
            Just(Side::Right),
            Just(Side::Above),
            Just(Side::Below)
        ],
        0i32..200,
        1i32..200,
        -100i32..100,
        1i32..200,
    )
        .prop_map(|(w, h, side, gap, extent, across, span)| {
            let (w_i, h_i) = (w as i32, h as i32);
            let rect = match side {
                Side::Left => Rect::new(-gap - extent, across, -gap, across + span),
                Side::Right => Rect::new(w_i + gap, across, w_i + gap + extent, across + span),
                Side::Above => Rect::new(across, -gap - extent, across + span, -gap),
                Side::Below => Rect::new(across, h_i + gap, across + span, h_i + gap + extent),
            };
            (w, h, rect, side)
        })
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        rng_algorithm: proptest::test_runner::RngAlgorithm::ChaCha,
        rng_seed: proptest::test_runner::RngSeed::Fixed(0x5EED_D3D9),
        .. ProptestConfig::default()
    })]

    #[test]
    fn descriptor_fields_reassemble_the_word(desc in packable_format(), word in any::<u32>()) {
        let word_bits = desc.bytes_per_pixel as u32 * 8;
        let word = if word_bits == 32 { word } else { word & ((1 << word_bits) - 1) };
        let fields = desc.unpack(word);

        let mut rebuilt = 0u32;
        let mut covered = 0u32;
        for channel in Channel::ALL {
            let i = channel as usize;
            prop_assert!(desc.channel_bits[i] == 0 || fields[i] >> desc.channel_bits[i] == 0);
            rebuilt |= fields[i] << desc.channel_shift[i];
            covered |= desc.channel_mask(channel);
        }
        prop_assert_eq!(rebuilt, word & covered);
    }

    #[test]
    fn packed_fields_are_truncated_or_zero_filled(
        desc in packable_format(),
        (depth, channels) in source_depth().prop_flat_map(|d| (Just(d), samples(d))),
    ) {
        let word = pack_pixel(channels, depth, &desc).unwrap();
        let fields = desc.unpack(word);
        let src_bits = depth.bits();

        for channel in Channel::ALL {
            let i = channel as usize;
            let dst_bits = desc.channel_bits[i];
            let expected = if dst_bits == 0 {
                0
            } else if dst_bits <= src_bits {
                channels[i] >> (src_bits - dst_bits)
            } else {
                channels[i] << (dst_bits - src_bits)
            };
            prop_assert_eq!(fields[i], expected, "{:?} {:?}", desc.format, channel);
        }
        // Nothing lands outside the channel fields.
        let covered = Channel::ALL.iter().fold(0, |acc, &c| acc | desc.channel_mask(c));
        prop_assert_eq!(word & !covered, 0);
    }

    #[test]
    fn fast_kernels_agree_with_generic_packer(
        pixels in proptest::collection::vec(any::<u8>(), 4..=256),
    ) {
        let width = pixels.len() / 4;
        let rgba8 = &pixels[..width * 4];
        let cases = [
            (SourceFormat::Rgba8, D3DFormat::R5G6B5),
            (SourceFormat::Rgba8, D3DFormat::X1R5G5B5),
            (SourceFormat::Rgba8, D3DFormat::A4R4G4B4),
            (SourceFormat::Rgba8, D3DFormat::A8R8G8B8),
            (SourceFormat::Rgba16, D3DFormat::A4R4G4B4),
            (SourceFormat::Rgba16, D3DFormat::A8R8G8B8),
        ];
        for (source, dest) in cases {
            let fast = Kernel::select(source, dest, &BlitConfig::default()).unwrap();
            let slow = Kernel::select(source, dest, &BlitConfig::generic_only()).unwrap();
            prop_assert!(matches!(slow, Kernel::Generic(_)));

            let mut a = vec![0u8; width * fast.dst_bytes_per_pixel()];
            let mut b = a.clone();
            fast.convert_row(rgba8, &mut a, width);
            slow.convert_row(rgba8, &mut b, width);
            prop_assert_eq!(a, b, "{:?} -> {:?}", source, dest);
        }
    }

    #[test]
    fn bulk_copy_equals_row_copy(
        width in 1u32..32,
        height in 1u32..16,
        padding in 1usize..8,
        seed in any::<u8>(),
    ) {
        let len = width as usize * height as usize;
        let data: Vec<u8> = (0..len).map(|i| (i as u8).wrapping_mul(31) ^ seed).collect();
        let src = SourceImage::new(&data, width, height, SourceFormat::ColorIndex).unwrap();

        let mut tight = vec![0u8; len];
        let mut dst = PixelBuffer::new(&mut tight, width, height, width as usize, D3DFormat::P8)
            .unwrap();
        blit_image(&mut dst, &src, &Kernel::ColorIndex).unwrap();
        prop_assert_eq!(&tight, &data);

        let pitch = width as usize + padding;
        let mut padded = vec![0u8; pitch * height as usize];
        let mut dst = PixelBuffer::new(&mut padded, width, height, pitch, D3DFormat::P8).unwrap();
        blit_image(&mut dst, &src, &Kernel::ColorIndex).unwrap();
        let rows: Vec<u8> = padded
            .chunks(pitch)
            .flat_map(|row| row[..width as usize].to_vec())
            .collect();
        prop_assert_eq!(rows, tight);
    }

    #[test]
    fn rects_outside_the_destination_write_nothing((w, h, rect, side) in outside_rect()) {
        prop_assert_eq!(rect.clip(w, h), None, "{:?}", side);

        let src_data = vec![0xFFu8; 64 * 64];
        let src = PitchedImage::new(&src_data, 64, 64, 64, SourceFormat::ColorIndex).unwrap();
        let mut bits = vec![0u8; (w * h) as usize];
        let mut dst = PixelBuffer::new(&mut bits, w, h, w as usize, D3DFormat::P8).unwrap();
        prop_assert_eq!(blit_region(&mut dst, &src, rect, &Kernel::ColorIndex), 0);
        prop_assert!(bits.iter().all(|&b| b == 0));

        let mut surface = MemorySurface::new(D3DFormat::P8, w, h).unwrap();
        let written = draw_pitched_pixels(&mut surface, rect, &src, &BlitConfig::default());
        prop_assert_eq!(written, Ok(0));
        prop_assert_eq!(surface.lock_count(), 0);
    }

    #[test]
    fn square_only_normalization_is_square(
        width in 1u32..4096,
        height in 1u32..4096,
        cap in proptest::option::of(1u32..16),
    ) {
        let constraints = TextureConstraints {
            square_only: true,
            ..TextureConstraints::UNCONSTRAINED
        };
        let config = BlitConfig {
            square_aspect_cap: cap,
            ..BlitConfig::default()
        };
        let (w, h) = normalize_dimensions(width, height, &constraints, &config);
        prop_assert_eq!(w, h);
        prop_assert!(w >= 1);
    }

    #[test]
    fn aspect_limited_normalization_respects_the_ratio(
        width in 1u32..8192,
        height in 1u32..8192,
        ratio_log2 in 1u32..5,
    ) {
        let ratio = 1 << ratio_log2;
        let constraints = TextureConstraints {
            max_aspect_ratio: ratio,
            ..TextureConstraints::UNCONSTRAINED
        };
        let (w, h) = normalize_dimensions(width, height, &constraints, &BlitConfig::default());
        prop_assert!(w >= 1 && h >= 1);
        prop_assert!(w.max(h) / w.min(h) <= ratio, "{}x{} -> {}x{}", width, height, w, h);
        prop_assert!(w <= width && h <= height);
    }
}

#[test]
fn generic_packer_rejects_three_byte_words_for_every_depth() {
    let desc = PixelFormatDescriptor::resolve(D3DFormat::R8G8B8);
    for depth in [SourceDepth::Bits8, SourceDepth::Bits4] {
        assert!(GenericPacker::new(desc, depth).is_err());
    }
}
