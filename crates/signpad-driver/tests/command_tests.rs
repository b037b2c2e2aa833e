//! Device commands and image transfer on a connected pad.

mod common;

use common::{SCREEN_BYTES, TestResult, connected};
use signpad_driver::{
    Color, DriverError, UploadOutcome, UploadStage, WriteOutcome, WritingArea, WritingMode,
};
use signpad_hid_stu_protocol::{ProtocolError, payload};

// ceil(800 * 480 * 3 / 253)
const SCREEN_CHUNKS: usize = 4554;

#[tokio::test]
async fn test_simple_commands_write_expected_payloads() -> TestResult {
    let fx = connected().await?;
    let area = WritingArea::new(100, 200, 10000, 6000);

    fx.pad.set_writing_area(area).await?;
    fx.pad.set_pen_color_and_width("#0000FF", 2).await?;
    fx.pad.set_inking(true).await?;
    fx.pad.set_writing_mode(WritingMode::Timing).await?;
    fx.pad.clear_screen().await?;

    assert_eq!(
        fx.device.write_history(),
        vec![
            (0x2A, payload::writing_area(&area).to_vec()),
            (0x2D, vec![0x00, 0x00, 0xFF, 2]),
            (0x21, vec![1]),
            (0x0E, vec![1]),
            (0x20, vec![0]),
        ]
    );
    assert!(fx.device.read_history().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_oversized_writing_area_is_still_sent() -> TestResult {
    let fx = connected().await?;
    let area = WritingArea::new(0, 0, 20000, 20000);

    fx.pad.set_writing_area(area).await?;
    assert_eq!(fx.device.written_report_ids(), vec![0x2A]);
    Ok(())
}

#[tokio::test]
async fn test_invalid_color_fails_without_io() -> TestResult {
    let fx = connected().await?;

    let err = fx
        .pad
        .set_pen_color_and_width("#GG0000", 1)
        .await
        .err()
        .ok_or("invalid color accepted")?;
    assert!(matches!(
        err,
        DriverError::Protocol(ProtocolError::InvalidColor(_))
    ));
    assert!(matches!(
        fx.pad.set_background_color("blue").await,
        Err(DriverError::Protocol(ProtocolError::InvalidColor(_)))
    ));
    assert!(fx.device.write_history().is_empty());
    assert!(fx.device.read_history().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_backlight_writes_only_on_change() -> TestResult {
    let fx = connected().await?;

    assert_eq!(fx.pad.set_backlight(2).await?, WriteOutcome::Unchanged);
    assert!(fx.device.write_history().is_empty());
    assert_eq!(fx.pad.cached_backlight(), Some(2));

    assert_eq!(fx.pad.set_backlight(3).await?, WriteOutcome::Written);
    assert_eq!(fx.device.write_history(), vec![(0x2B, vec![3, 0])]);
    assert_eq!(fx.pad.cached_backlight(), Some(3));

    // the device now reports 3, so nothing further is written
    assert_eq!(fx.pad.set_backlight(3).await?, WriteOutcome::Unchanged);
    assert_eq!(fx.device.written_report_ids(), vec![0x2B]);
    assert_eq!(fx.device.read_history(), vec![0x2B, 0x2B, 0x2B]);
    Ok(())
}

#[tokio::test]
async fn test_background_color_writes_only_on_change() -> TestResult {
    let fx = connected().await?;

    assert_eq!(
        fx.pad.set_background_color("#FFFFFF").await?,
        WriteOutcome::Unchanged
    );
    assert!(fx.device.write_history().is_empty());

    assert_eq!(
        fx.pad.set_background_color("102030").await?,
        WriteOutcome::Written
    );
    assert_eq!(
        fx.device.write_history(),
        vec![(0x2E, vec![0x10, 0x20, 0x30])]
    );
    assert_eq!(
        fx.pad.cached_background_color(),
        Some(Color::new(0x10, 0x20, 0x30))
    );
    Ok(())
}

#[tokio::test]
async fn test_full_screen_image_upload() -> TestResult {
    let fx = connected().await?;
    let image = vec![0x7F; SCREEN_BYTES];

    let outcome = fx.pad.set_image(Some(&image)).await?;
    assert_eq!(outcome, UploadOutcome::Sent { chunks: SCREEN_CHUNKS });

    let writes = fx.device.write_history();
    assert_eq!(writes.len(), SCREEN_CHUNKS + 2);
    assert_eq!(writes.first(), Some(&(0x25, vec![0x04])));
    assert_eq!(writes.last(), Some(&(0x27, vec![0x00])));

    let data: Vec<&Vec<u8>> = writes
        .iter()
        .filter(|(id, _)| *id == 0x26)
        .map(|(_, payload)| payload)
        .collect();
    assert_eq!(data.len(), SCREEN_CHUNKS);
    for frame in data.iter().take(SCREEN_CHUNKS - 1) {
        assert_eq!(frame.len(), 255);
        assert_eq!(frame.get(..2), Some(&[253, 0][..]));
    }
    // 1_152_000 - 4553 * 253 = 91 bytes left for the last chunk
    let last = data.last().ok_or("no data frames")?;
    assert_eq!(last.len(), 93);
    assert_eq!(last.get(..2), Some(&[91, 0][..]));

    let body: usize = data.iter().map(|frame| frame.len() - 2).sum();
    assert_eq!(body, SCREEN_BYTES);
    Ok(())
}

#[tokio::test]
async fn test_image_with_wrong_size_is_rejected_before_io() -> TestResult {
    let fx = connected().await?;

    assert_eq!(
        fx.pad.set_image(Some(&[0u8; 10])).await,
        Err(DriverError::ImageSizeMismatch {
            expected: SCREEN_BYTES,
            actual: 10,
        })
    );
    assert!(fx.device.write_history().is_empty());
    // nothing retained either
    assert_eq!(fx.pad.set_image(None).await?, UploadOutcome::NothingToSend);
    Ok(())
}

#[tokio::test]
async fn test_failed_chunk_aborts_then_resend_recovers() -> TestResult {
    let fx = connected().await?;
    fx.device.fail_write(0x26, 2);
    let image = vec![0u8; SCREEN_BYTES];

    let err = fx
        .pad
        .set_image(Some(&image))
        .await
        .err()
        .ok_or("upload succeeded")?;
    match err {
        DriverError::TransferAborted { stage, source } => {
            assert_eq!(stage, UploadStage::Data { index: 1 });
            assert!(matches!(
                *source,
                DriverError::TransportWriteFailed {
                    report_id: 0x26,
                    ..
                }
            ));
        }
        other => return Err(format!("unexpected error: {other}").into()),
    }
    assert_eq!(fx.device.written_report_ids(), vec![0x25, 0x26, 0x26]);

    fx.device.clear_history();
    assert_eq!(
        fx.pad.set_image(None).await?,
        UploadOutcome::Sent {
            chunks: SCREEN_CHUNKS
        }
    );
    assert_eq!(fx.device.write_history().len(), SCREEN_CHUNKS + 2);
    Ok(())
}

#[tokio::test]
async fn test_resend_without_image_sends_nothing() -> TestResult {
    let fx = connected().await?;

    assert_eq!(fx.pad.set_image(None).await?, UploadOutcome::NothingToSend);
    assert!(fx.device.write_history().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_image_survives_reconnect() -> TestResult {
    let fx = connected().await?;
    fx.pad.set_image(Some(&vec![1u8; SCREEN_BYTES])).await?;

    fx.pad.disconnect().await;
    fx.pad.connect().await?;
    fx.device.clear_history();

    assert_eq!(
        fx.pad.set_image(None).await?,
        UploadOutcome::Sent {
            chunks: SCREEN_CHUNKS
        }
    );
    Ok(())
}

#[tokio::test]
async fn test_clear_drawing_redraws_between_ink_toggles() -> TestResult {
    let fx = connected().await?;
    fx.pad.set_image(Some(&vec![0xFF; SCREEN_BYTES])).await?;
    fx.device.clear_history();

    assert_eq!(
        fx.pad.clear_drawing().await?,
        UploadOutcome::Sent {
            chunks: SCREEN_CHUNKS
        }
    );
    let writes = fx.device.write_history();
    assert_eq!(writes.len(), SCREEN_CHUNKS + 4);
    assert_eq!(writes.first(), Some(&(0x21, vec![0])));
    assert_eq!(writes.get(1).map(|(id, _)| *id), Some(0x25));
    assert_eq!(writes.last(), Some(&(0x21, vec![1])));
    Ok(())
}

#[tokio::test]
async fn test_clear_drawing_without_image_only_toggles_ink() -> TestResult {
    let fx = connected().await?;

    assert_eq!(
        fx.pad.clear_drawing().await?,
        UploadOutcome::NothingToSend
    );
    assert_eq!(
        fx.device.write_history(),
        vec![(0x21, vec![0]), (0x21, vec![1])]
    );
    Ok(())
}
