use lib_transfer::{
    remove_response, ComputationContext, Dispatcher, FatalError, ForwardRequest, InverseOptions,
    NormalizationStatus, UnitTransform,
};
use lib_dsp::FftEngine;
use lib_types::{
    Calibration, CalibrationPair, ChannelIdentity, ChannelMatchPolicy, Complex64, Epoch,
    ResponseMetadata, ResponseSource, ResponseType, TimeWindow, Units, Waveform,
};
use std::f64::consts::PI;
use std::io::Write;
use std::sync::Arc;
use std::thread;

const DIGITIZER: &str = "\
# gain stage followed by a pass-through FIR
theoretical 1 sensor PAZ2 1000.0 0 0
theoretical 2 digitizer DIG2 20.0
theoretical 3 decimation FIR2 1
 1.0
";

fn metadata(id: i64) -> ResponseMetadata {
    ResponseMetadata::new(id, ResponseType::PazFir, ResponseSource::NdcText { text: DIGITIZER.into() })
        .with_input_units(Units::Nanometers)
        .with_validity(TimeWindow::new(Some(Epoch(0.0)), Some(Epoch(86_400.0))))
}

fn identity(location: &str) -> ChannelIdentity {
    ChannelIdentity::new("IU", "ANMO", "BHZ", location)
}

fn dispatcher() -> Dispatcher {
    Dispatcher::new(ComputationContext::default()).unwrap()
}

#[test]
fn test_nearly_equal_rates_share_an_entry() {
    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = metadata(1);

    dispatcher
        .compute_forward(&ForwardRequest::new(1000, 99.95, Epoch(10.0), &id, &meta))
        .unwrap();
    dispatcher
        .compute_forward(&ForwardRequest::new(1000, 100.0, Epoch(10.0), &id, &meta))
        .unwrap();

    let cache = dispatcher.cache();
    assert_eq!((cache.forward_hits(), cache.forward_misses()), (1, 1));
    assert_eq!(cache.sizes().0, 1);
}

#[test]
fn test_expired_entry_is_recomputed() {
    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = metadata(1);

    dispatcher
        .compute_forward(&ForwardRequest::new(256, 20.0, Epoch(10.0), &id, &meta))
        .unwrap();
    let late = dispatcher
        .compute_forward(&ForwardRequest::new(256, 20.0, Epoch(90_000.0), &id, &meta))
        .unwrap();

    assert_eq!(late.len(), 129);
    assert_eq!(dispatcher.cache().forward_hits(), 0);
    assert_eq!(dispatcher.cache().forward_misses(), 2);
}

#[test]
fn test_callers_get_independent_copies() {
    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = metadata(1);
    let request = ForwardRequest::new(256, 20.0, Epoch(10.0), &id, &meta);

    let mut mine = dispatcher.compute_forward(&request).unwrap();
    assert_eq!(mine.convert_units(Units::NanometersPerSecond).unwrap(), UnitTransform::IntegrateOnce);

    let theirs = dispatcher.compute_forward(&request).unwrap();
    assert_eq!(theirs.units(), Units::Nanometers);
    assert_eq!(theirs.transform(), UnitTransform::None);
    assert_ne!(mine.current(), theirs.current());
}

#[test]
fn test_match_policy_controls_sharing() {
    let context = ComputationContext::new(ChannelMatchPolicy::IgnoreLocation, Default::default());
    let dispatcher = Dispatcher::new(context).unwrap();
    let (a, b) = (identity("00"), identity("10"));
    let meta = metadata(1);

    dispatcher
        .compute_forward(&ForwardRequest::new(256, 20.0, Epoch(10.0), &a, &meta))
        .unwrap();
    dispatcher
        .compute_forward(&ForwardRequest::new(256, 20.0, Epoch(10.0), &b, &meta))
        .unwrap();
    assert_eq!(dispatcher.cache().forward_hits(), 1);

    let exact = ForwardRequest {
        match_policy: Some(ChannelMatchPolicy::Exact),
        ..ForwardRequest::new(256, 20.0, Epoch(10.0), &b, &meta)
    };
    dispatcher.compute_forward(&exact).unwrap();
    assert_eq!(dispatcher.cache().forward_misses(), 2);
}

#[test]
fn test_inverse_with_integration() {
    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = metadata(1);
    let request = ForwardRequest::new(256, 20.0, Epoch(10.0), &id, &meta);

    let inverse = dispatcher
        .compute_inverse(&request, &InverseOptions::new(Units::NanometersPerSecond))
        .unwrap();
    assert_eq!(inverse.units(), Units::NanometersPerSecond);
    assert_eq!(inverse.nfft(), 256);

    // forward is 1000 / (j w) counts per nm/s, so the inverse is j w / 1000
    let delfreq = 20.0 / 256.0;
    for (k, value) in inverse.values().iter().enumerate().skip(1) {
        let expected = Complex64::new(0.0, 2.0 * PI * k as f64 * delfreq / 1000.0);
        assert!((value - expected).norm() < 1e-9 * expected.norm().max(1.0));
    }
}

#[test]
fn test_calibrated_response_is_normalized() {
    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = ResponseMetadata::new(
        5,
        ResponseType::Paz,
        ResponseSource::NdcText {
            text: "theoretical 1 sensor PAZ2 1.0 0 0\n".into(),
        },
    )
    .with_calibration(Calibration {
        waveform: Some(CalibrationPair::new(0.5, 1.0)),
        nominal: None,
    });

    let data = dispatcher
        .compute_forward(&ForwardRequest::new(256, 20.0, Epoch(0.0), &id, &meta))
        .unwrap();
    assert_eq!(data.normalization(), NormalizationStatus::Normalized);
    assert!((data.scale_factor() - 0.5).abs() < 1e-12);
    assert!((data.amplitude_at(1.0).unwrap() - 2.0).abs() < 1e-9);
}

#[test]
fn test_stage_file_on_disk() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(DIGITIZER.as_bytes()).unwrap();

    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = ResponseMetadata::new(
        7,
        ResponseType::PazFir,
        ResponseSource::NdcFile { path: file.path().to_path_buf() },
    );
    let data = dispatcher
        .compute_forward(&ForwardRequest::new(64, 20.0, Epoch(0.0), &id, &meta))
        .unwrap();
    assert!(data.amplitudes().iter().all(|a| (a - 1000.0).abs() < 1e-6));
}

#[test]
fn test_fatal_faults_reach_the_caller() {
    let dispatcher = dispatcher();
    let id = identity("00");

    let unsupported = ResponseMetadata::new(1, ResponseType::from_tag("blockette"), ResponseSource::None);
    let err = dispatcher
        .compute_forward(&ForwardRequest::new(64, 20.0, Epoch(0.0), &id, &unsupported))
        .unwrap_err();
    assert!(matches!(err, FatalError::UnsupportedResponseType(ref name) if name == "blockette"));

    let orphan = ResponseMetadata::new(
        2,
        ResponseType::Fir,
        ResponseSource::NdcText {
            text: "theoretical 1 decimation FIR2 1\n 1.0\n".into(),
        },
    );
    let err = dispatcher
        .compute_forward(&ForwardRequest::new(64, 20.0, Epoch(0.0), &id, &orphan))
        .unwrap_err();
    assert!(matches!(err, FatalError::Config(_)));

    let malformed = ResponseMetadata::new(
        3,
        ResponseType::Paz,
        ResponseSource::NdcText {
            text: "theoretical 1 sensor PAZ2 abc 0 0\n".into(),
        },
    );
    let err = dispatcher
        .compute_forward(&ForwardRequest::new(64, 20.0, Epoch(0.0), &id, &malformed))
        .unwrap_err();
    assert!(matches!(err, FatalError::Parse(_)));
}

#[test]
fn test_concurrent_requests() {
    let dispatcher = Arc::new(dispatcher());
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let dispatcher = Arc::clone(&dispatcher);
            thread::spawn(move || {
                let id = identity("00");
                let meta = metadata(t % 2);
                for _ in 0..10 {
                    let mut data = dispatcher
                        .compute_forward(&ForwardRequest::new(512, 40.0, Epoch(1.0), &id, &meta))
                        .unwrap();
                    data.convert_units(Units::Meters).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let cache = dispatcher.cache();
    assert_eq!(cache.forward_hits() + cache.forward_misses(), 80);
    assert_eq!(cache.sizes().0, 2);

    let id = identity("00");
    let meta = metadata(0);
    let fresh = dispatcher
        .compute_forward(&ForwardRequest::new(512, 40.0, Epoch(1.0), &id, &meta))
        .unwrap();
    assert_eq!(fresh.units(), Units::Nanometers);
}

#[test]
fn test_remove_gain_response() {
    let dispatcher = dispatcher();
    let id = identity("00");
    let meta = metadata(1);
    let samples: Vec<f64> = (0..200).map(|i| 1000.0 * (2.0 * PI * i as f64 / 25.0).sin()).collect();
    let recorded = Waveform::new(samples, 20.0, Epoch(5.0), Units::Counts);

    let request = ForwardRequest::new(recorded.len(), recorded.sample_rate, recorded.start, &id, &meta);
    let inverse = dispatcher
        .compute_inverse(&request, &InverseOptions::new(Units::Nanometers))
        .unwrap();
    let ground = remove_response(&recorded, &inverse, &mut FftEngine::new(), 0.0).unwrap();

    assert_eq!(ground.units, Units::Nanometers);
    let mean = recorded.mean();
    for (g, r) in ground.samples.iter().zip(&recorded.samples) {
        assert!((g - (r - mean) / 1000.0).abs() < 1e-9);
    }
}

#[test]
fn test_metadata_registry() {
    let dispatcher = dispatcher();
    dispatcher.register_metadata(metadata(42));
    assert!(dispatcher.lookup_metadata(42, Epoch(100.0)).is_some());
    assert!(dispatcher.lookup_metadata(42, Epoch(-100.0)).is_none());
    assert!(dispatcher.cache().diagnostics().ends_with("Metadata: 1 hits, 1 misses"));
}
