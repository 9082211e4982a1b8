mod common;

use approx::assert_abs_diff_eq;
use ndarray::Array2;

use octrack_core::error::TrackError;
use octrack_core::frame::{ColorMode, FrameSize, ProcessedFrame};
use octrack_core::io::image_io::{load_image, save_history_png, save_processed_png, HistoryMark};
use octrack_core::io::ser::SerReader;
use octrack_core::io::source::{open_source, FrameSource, ImageSequenceSource, SerSource};

#[test]
fn test_ser_mono8() {
    let frames = vec![vec![0u8, 51, 102, 153, 204, 255], vec![10u8; 6]];
    let file = common::write_temp(&common::build_ser(3, 2, &frames, None));
    let reader = SerReader::open(file.path()).unwrap();

    assert_eq!(reader.frame_count(), 2);
    assert_eq!(reader.header.color_mode(), ColorMode::Mono);
    assert!(!reader.has_timestamps());

    let frame = reader.read_frame(0).unwrap();
    assert_eq!(frame.data.dim(), (2, 3));
    assert_abs_diff_eq!(frame.data[[0, 1]], 51.0, epsilon = 1e-4);
    assert_abs_diff_eq!(frame.data[[1, 2]], 255.0, epsilon = 1e-4);
    assert_eq!(frame.metadata.frame_index, 0);
    assert_eq!(frame.metadata.timestamp_us, None);

    let frame = reader.read_frame(1).unwrap();
    assert_eq!(frame.metadata.frame_index, 1);
    assert!(frame.data.iter().all(|&v| (v - 10.0).abs() < 1e-4));
}

#[test]
fn test_ser_mono16_is_rescaled() {
    let mut buf = common::build_ser_header(2, 1, 16, 1, 0);
    for v in [65535u16, 0] {
        buf.extend_from_slice(&v.to_le_bytes());
    }
    let file = common::write_temp(&buf);
    let frame = SerReader::open(file.path()).unwrap().read_frame(0).unwrap();
    assert_abs_diff_eq!(frame.data[[0, 0]], 255.0, epsilon = 1e-3);
    assert_abs_diff_eq!(frame.data[[0, 1]], 0.0);

    let mut buf = common::build_ser_header(1, 1, 12, 1, 0);
    buf.extend_from_slice(&4095u16.to_le_bytes());
    let file = common::write_temp(&buf);
    let frame = SerReader::open(file.path()).unwrap().read_frame(0).unwrap();
    assert_abs_diff_eq!(frame.data[[0, 0]], 255.0, epsilon = 1e-3);
}

#[test]
fn test_ser_rgb_uses_green() {
    let mut buf = common::build_ser_header(2, 1, 8, 1, 100);
    buf.extend_from_slice(&[200, 40, 10, 0, 90, 255]);
    let file = common::write_temp(&buf);
    let reader = SerReader::open(file.path()).unwrap();
    assert_eq!(reader.header.color_mode(), ColorMode::RGB);

    let frame = reader.read_frame(0).unwrap();
    assert_eq!(frame.data.dim(), (1, 2));
    assert_abs_diff_eq!(frame.data[[0, 0]], 40.0, epsilon = 1e-4);
    assert_abs_diff_eq!(frame.data[[0, 1]], 90.0, epsilon = 1e-4);
}

#[test]
fn test_ser_bayer_interpolates_green() {
    // R G / G B for RGGB, G R / B G for GRBG.
    let mosaic = [200u8, 40, 60, 10];

    let mut buf = common::build_ser_header(2, 2, 8, 1, 8);
    buf.extend_from_slice(&mosaic);
    let file = common::write_temp(&buf);
    let reader = SerReader::open(file.path()).unwrap();
    assert_eq!(reader.header.color_mode(), ColorMode::BayerRGGB);
    let frame = reader.read_frame(0).unwrap();
    let expected = [[50.0, 40.0], [60.0, 50.0]];
    for ((r, c), &v) in frame.data.indexed_iter() {
        assert_abs_diff_eq!(v, expected[r][c], epsilon = 1e-4);
    }

    let mut buf = common::build_ser_header(2, 2, 8, 1, 9);
    buf.extend_from_slice(&mosaic);
    let file = common::write_temp(&buf);
    let frame = SerReader::open(file.path()).unwrap().read_frame(0).unwrap();
    let expected = [[200.0, 105.0], [105.0, 10.0]];
    for ((r, c), &v) in frame.data.indexed_iter() {
        assert_abs_diff_eq!(v, expected[r][c], epsilon = 1e-4);
    }
}

#[test]
fn test_ser_source_info() {
    let frames = vec![vec![0u8; 6]; 2];
    let file = common::write_temp(&common::build_ser(3, 2, &frames, None));
    let info = SerReader::open(file.path()).unwrap().source_info(file.path());

    assert_eq!(info.total_frames, 2);
    assert_eq!((info.width, info.height), (3, 2));
    assert_eq!(info.bit_depth, 8);
    assert_eq!(info.color_mode, ColorMode::Mono);
    assert_eq!(info.operator.as_deref(), Some("Test"));
    assert_eq!(info.camera.as_deref(), Some("OCT cam"));
    assert_eq!(info.optics, None);
}

#[test]
fn test_ser_errors() {
    let frames = vec![vec![0u8; 4]];
    let file = common::write_temp(&common::build_ser(2, 2, &frames, None));
    let reader = SerReader::open(file.path()).unwrap();
    assert!(matches!(
        reader.read_frame(1),
        Err(TrackError::FrameIndexOutOfRange { index: 1, total: 1 })
    ));

    // Header promises two frames, file holds one.
    let mut buf = common::build_ser_header(2, 2, 8, 2, 0);
    buf.extend_from_slice(&[0u8; 4]);
    let file = common::write_temp(&buf);
    assert!(matches!(
        SerReader::open(file.path()),
        Err(TrackError::InvalidSer(_))
    ));

    let mut buf = common::build_ser(2, 2, &frames, None);
    buf[..6].copy_from_slice(b"NOTSER");
    let file = common::write_temp(&buf);
    assert!(matches!(
        SerReader::open(file.path()),
        Err(TrackError::InvalidSer(_))
    ));

    let file = common::write_temp(b"LUCAM-RECORDER");
    assert!(matches!(
        SerReader::open(file.path()),
        Err(TrackError::InvalidSer(_))
    ));

    let file = common::write_temp(&common::build_ser_header(0, 4, 8, 0, 0));
    assert!(matches!(
        SerReader::open(file.path()),
        Err(TrackError::InvalidDimensions { .. })
    ));
}

#[test]
fn test_ser_timestamps() {
    let frames = vec![vec![0u8; 4]; 4];
    // 100 ns ticks: 0, 250, 500 and 750 ms after an arbitrary epoch.
    let base = 638_000_000_000_000_000u64;
    let ticks: Vec<u64> = (0..4).map(|i| base + i * 2_500_000).collect();
    let file = common::write_temp(&common::build_ser(2, 2, &frames, Some(&ticks)));

    let reader = SerReader::open(file.path()).unwrap();
    assert!(reader.has_timestamps());
    assert_eq!(reader.timestamp_us(1), Some(base / 10 + 250_000));
    assert_eq!(reader.timestamp_us(4), None);
    assert_eq!(
        reader.read_frame(2).unwrap().metadata.timestamp_us,
        Some(base / 10 + 500_000)
    );

    let source = SerSource::open(file.path(), None).unwrap();
    assert_abs_diff_eq!(source.timestamp_seconds(3).unwrap(), 0.75, epsilon = 1e-9);
    assert_eq!(source.frame_at_time(0.0).unwrap(), 0);
    assert_eq!(source.frame_at_time(0.3).unwrap(), 1);
    // Exactly between frames 1 and 2.
    assert_eq!(source.frame_at_time(0.375).unwrap(), 1);
    assert_eq!(source.frame_at_time(0.4).unwrap(), 2);
    assert_eq!(source.frame_at_time(10.0).unwrap(), 3);
    assert!(matches!(
        source.frame_at_time(-1.0),
        Err(TrackError::InvalidConfig { .. })
    ));
}

#[test]
fn test_ser_source_without_timestamps() {
    let frames = vec![vec![0u8; 4]; 3];
    let file = common::write_temp(&common::build_ser(2, 2, &frames, None));
    let source = SerSource::open(file.path(), None).unwrap();

    assert_eq!(source.timestamp_seconds(1), None);
    assert_eq!(source.frame_rate(), 25.0);
    // round(0.043 s · 25 fps) = 1
    assert_eq!(source.frame_at_time(0.043).unwrap(), 1);
    assert!(matches!(
        source.frame_at_time(1.0),
        Err(TrackError::FrameIndexOutOfRange { index: 25, total: 3 })
    ));
}

#[test]
fn test_ser_source_resizes() {
    let frames = vec![vec![100u8; 8 * 4]];
    let file = common::write_temp(&common::build_ser(8, 4, &frames, None));
    let source = SerSource::open(file.path(), Some(4)).unwrap();

    assert_eq!(source.frame_size(), FrameSize::new(4, 2));
    assert_eq!(source.reader().frame_count(), 1);
    let frame = source.read_frame(0).unwrap();
    assert_eq!(frame.size(), FrameSize::new(4, 2));
    assert!(frame.data.iter().all(|&v| (v - 100.0).abs() < 1e-3));
}

fn write_gray_png(path: &std::path::Path, width: u32, height: u32, value: u8) {
    image::GrayImage::from_pixel(width, height, image::Luma([value]))
        .save(path)
        .unwrap();
}

#[test]
fn test_image_sequence_order_and_lookup() {
    let dir = tempfile::tempdir().unwrap();
    write_gray_png(&dir.path().join("frame_002.png"), 6, 4, 30);
    write_gray_png(&dir.path().join("frame_000.png"), 6, 4, 10);
    write_gray_png(&dir.path().join("frame_001.png"), 6, 4, 20);
    std::fs::write(dir.path().join("notes.txt"), "not an image").unwrap();

    let source = ImageSequenceSource::open(dir.path(), None).unwrap();
    assert_eq!(source.frame_count(), 3);
    assert!(source.paths()[0].ends_with("frame_000.png"));
    assert_eq!(source.frame_size(), FrameSize::new(6, 4));

    let frame = source.read_frame(2).unwrap();
    assert_eq!(frame.metadata.frame_index, 2);
    assert_abs_diff_eq!(frame.data[[0, 0]], 30.0, epsilon = 1e-3);

    assert_eq!(source.timestamp_seconds(0), None);
    assert_eq!(source.frame_at_time(0.043).unwrap(), 1);
    let slow = source.with_frame_rate(10.0);
    assert_eq!(slow.frame_at_time(0.16).unwrap(), 2);
}

#[test]
fn test_image_sequence_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        ImageSequenceSource::open(dir.path(), None),
        Err(TrackError::EmptySequence)
    ));

    write_gray_png(&dir.path().join("a.png"), 6, 4, 10);
    write_gray_png(&dir.path().join("b.png"), 5, 4, 10);
    let source = ImageSequenceSource::open(dir.path(), None).unwrap();
    assert!(source.read_frame(0).is_ok());
    assert!(matches!(
        source.read_frame(1),
        Err(TrackError::FrameSizeMismatch { .. })
    ));
    assert!(matches!(
        source.read_frame(2),
        Err(TrackError::FrameIndexOutOfRange { .. })
    ));
}

#[test]
fn test_open_source_dispatch() {
    let dir = tempfile::tempdir().unwrap();
    write_gray_png(&dir.path().join("only.png"), 4, 4, 50);
    let source = open_source(dir.path(), None).unwrap();
    assert_eq!(source.frame_count(), 1);

    let frames = vec![vec![0u8; 4]; 2];
    let file = common::write_temp(&common::build_ser(2, 2, &frames, None));
    let source = open_source(file.path(), None).unwrap();
    assert_eq!(source.frame_count(), 2);
}

#[test]
fn test_processed_png_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("processed.png");
    let processed = ProcessedFrame {
        data: Array2::from_shape_fn((5, 7), |(r, c)| (r * 30 + c) as u8),
        gain: 2.0,
    };
    save_processed_png(&processed, &path).unwrap();

    let loaded = load_image(&path).unwrap();
    assert_eq!(loaded.size(), FrameSize::new(7, 5));
    for ((r, c), &v) in loaded.data.indexed_iter() {
        assert_abs_diff_eq!(v, processed.data[[r, c]] as f32, epsilon = 1e-3);
    }
}

#[test]
fn test_history_png_marks() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.png");
    let reference = ProcessedFrame {
        data: Array2::from_elem((20, 20), 127u8),
        gain: 1.0,
    };
    let marks = [
        HistoryMark {
            x: 5,
            y: 5,
            weight: 1.0,
        },
        HistoryMark {
            x: 19,
            y: 0,
            weight: 0.5,
        },
    ];
    save_history_png(&reference, &marks, &path).unwrap();

    let img = image::open(&path).unwrap().to_rgb8();
    assert_eq!(img.dimensions(), (20, 20));
    assert_eq!(img.get_pixel(5, 5).0, [255, 80, 0]);
    assert_eq!(img.get_pixel(7, 5).0, [255, 80, 0]);
    // Outside the dot radius.
    assert_eq!(img.get_pixel(7, 7).0, [127, 127, 127]);
    // Dots are clipped at the image border.
    assert_eq!(img.get_pixel(19, 0).0, [255, 40, 0]);
    assert_eq!(img.get_pixel(0, 19).0, [127, 127, 127]);
}
