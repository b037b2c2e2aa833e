//! Property tests for the image uploader over the mock transport.

use proptest::prelude::*;
use signpad_driver::{DriverError, FeatureChannel, ImageUploader, UploadOutcome, UploadStage};
use signpad_hid_common::HidHost;
use signpad_hid_common::mock::{MockFeatureDevice, MockHidHost};
use signpad_hid_stu_protocol::{ImageFormat, ImageGeometry};

type Writes = Vec<(u8, Vec<u8>)>;

struct Run {
    outcome: Result<UploadOutcome, DriverError>,
    writes: Writes,
}

/// Upload a `width x 1` image in a fresh runtime, optionally failing the
/// `fail_at`-th data write.
fn run_upload(
    width: u16,
    chunk_size: usize,
    fail_at: Option<usize>,
) -> Result<Run, Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async {
        let host = MockHidHost::new();
        let device = MockFeatureDevice::new(0x056A, 0x00A8, "mock://prop");
        host.add_device(device.clone());
        if let Some(occurrence) = fail_at {
            device.fail_write(0x26, occurrence);
        }

        let channel = FeatureChannel::new();
        channel.attach(host.open_device(device.info()).await?).await;
        let uploader = ImageUploader::new(ImageFormat::Bgr24, chunk_size)?;

        let geometry = ImageGeometry::new(width, 1);
        let image: Vec<u8> = (0..geometry.byte_len())
            .map(|i| u8::try_from(i % 251).unwrap_or_default())
            .collect();
        let outcome = uploader.set_image(&channel, geometry, Some(&image)).await;
        Ok::<_, Box<dyn std::error::Error>>(Run {
            outcome,
            writes: device.write_history(),
        })
    })
}

fn data_frames(writes: &Writes) -> Vec<&Vec<u8>> {
    writes
        .iter()
        .filter(|(id, _)| *id == 0x26)
        .map(|(_, frame)| frame)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_upload_reassembles_image(width in 1u16..400, chunk_size in 1usize..=253) {
        let run = run_upload(width, chunk_size, None)
            .map_err(|e| TestCaseError::fail(e.to_string()))?;
        let byte_len = usize::from(width) * 3;
        let expected_chunks = byte_len.div_ceil(chunk_size);

        prop_assert_eq!(run.outcome, Ok(UploadOutcome::Sent { chunks: expected_chunks }));
        prop_assert_eq!(run.writes.len(), expected_chunks + 2);
        prop_assert_eq!(run.writes.first().map(|(id, _)| *id), Some(0x25));
        prop_assert_eq!(run.writes.last().map(|(id, _)| *id), Some(0x27));

        let mut body = Vec::with_capacity(byte_len);
        for frame in data_frames(&run.writes) {
            match frame.as_slice() {
                [len, 0, bytes @ ..] => {
                    prop_assert_eq!(usize::from(*len), bytes.len());
                    prop_assert!(bytes.len() <= chunk_size);
                    body.extend_from_slice(bytes);
                }
                other => prop_assert!(false, "malformed frame {:?}", other),
            }
        }
        let expected: Vec<u8> = (0..byte_len)
            .map(|i| u8::try_from(i % 251).unwrap_or_default())
            .collect();
        prop_assert_eq!(body, expected);
    }

    #[test]
    fn prop_failed_chunk_stops_transfer(width in 20u16..200, fail_at in 1usize..=5) {
        // chunk size 10 gives at least 6 chunks for 20+ pixels
        let run = run_upload(width, 10, Some(fail_at))
            .map_err(|e| TestCaseError::fail(e.to_string()))?;

        match run.outcome {
            Err(DriverError::TransferAborted { stage, .. }) => {
                prop_assert_eq!(stage, UploadStage::Data { index: fail_at - 1 });
            }
            other => prop_assert!(false, "unexpected outcome {:?}", other),
        }
        prop_assert_eq!(data_frames(&run.writes).len(), fail_at);
        prop_assert!(run.writes.iter().all(|(id, _)| *id != 0x27));
    }
}
