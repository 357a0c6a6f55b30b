//! Debounced, last-request-wins scheduling of compression work.
//!
//! Rapid quality changes (a slider drag) coalesce into one pipeline run. Each
//! [`RequestScheduler::submit`] takes a new generation number and aborts the pending request.
//! Work that already started is not interrupted, but its result is only committed while its
//! generation is still the latest, so a slow stale request can never overwrite a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::DecodePolicy;
use crate::decode::{DecodedFrame, ImageRasterizer, RasterDecoder};
use crate::encode::EncoderBackend;
use crate::error::PipelineError;
use crate::pipeline::Compressor;
use crate::quality::QualityRequest;
use crate::types::{CompressedImage, CompressionResult};

/// A committed outcome tagged with the generation that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledResult {
    pub generation: u64,
    pub outcome: Result<CompressionResult, PipelineError>,
}

#[derive(Debug, Default)]
struct Selection {
    image: Option<Arc<CompressedImage>>,
    frame: Option<Arc<DecodedFrame>>,
}

#[derive(Debug)]
struct Shared<D> {
    compressor: Compressor<D>,
    selection: Mutex<Selection>,
    generation: AtomicU64,
    debounce: Duration,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Store `result` in `slot` only if its generation is `latest` and nothing at or after it
/// has been committed. Returns whether the slot changed.
fn commit_if_current(
    slot: &mut Option<ScheduledResult>,
    latest: u64,
    result: ScheduledResult,
) -> bool {
    let newer_committed = slot
        .as_ref()
        .is_some_and(|previous| previous.generation >= result.generation);
    if result.generation != latest || newer_committed {
        return false;
    }
    *slot = Some(result);
    true
}

impl<D: RasterDecoder> Shared<D> {
    fn latest_generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    fn is_latest(&self, generation: u64) -> bool {
        self.latest_generation() == generation
    }

    fn run<E: EncoderBackend + ?Sized>(
        &self,
        quality: QualityRequest,
        encoder: &E,
    ) -> Result<CompressionResult, PipelineError> {
        let (image, cached) = {
            let selection = lock(&self.selection);
            let image = selection.image.clone().ok_or(PipelineError::NoImageSelected)?;
            (image, selection.frame.clone())
        };

        let frame = match cached {
            Some(frame) => {
                log::debug!("Reusing cached {} frame", frame.dimensions());
                frame
            }
            None => {
                let frame = Arc::new(self.compressor.decode(&image)?);
                if self.compressor.config().decode_policy == DecodePolicy::DecodeOnce {
                    let mut selection = lock(&self.selection);
                    // The image may have been replaced while decoding.
                    if selection
                        .image
                        .as_ref()
                        .is_some_and(|current| Arc::ptr_eq(current, &image))
                    {
                        selection.frame = Some(Arc::clone(&frame));
                    }
                }
                frame
            }
        };

        self.compressor
            .encode_frame(&frame, image.byte_size(), quality, encoder)
    }
}

/// Runs compression requests for one selected image, committing only the newest result.
///
/// Requires a Tokio runtime with the blocking pool available.
#[derive(Debug)]
pub struct RequestScheduler<D = ImageRasterizer> {
    shared: Arc<Shared<D>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    results: Arc<watch::Sender<Option<ScheduledResult>>>,
}

impl<D> RequestScheduler<D>
where
    D: RasterDecoder + Send + Sync + 'static,
{
    pub fn new(compressor: Compressor<D>) -> Self {
        let debounce = Duration::from_millis(compressor.config().debounce_ms);
        let (results, _) = watch::channel(None);
        Self {
            shared: Arc::new(Shared {
                compressor,
                selection: Mutex::new(Selection::default()),
                generation: AtomicU64::new(0),
                debounce,
            }),
            pending: Mutex::new(None),
            results: Arc::new(results),
        }
    }

    pub fn compressor(&self) -> &Compressor<D> {
        &self.shared.compressor
    }

    /// Latest generation handed out by `submit` or `select`.
    pub fn generation(&self) -> u64 {
        self.shared.generation.load(Ordering::SeqCst)
    }

    /// Replace the selected image.
    ///
    /// Drops the cached frame and invalidates every outstanding request. A rejected image
    /// leaves nothing selected.
    pub fn select(&self, image: CompressedImage) -> Result<(), PipelineError> {
        self.invalidate();
        let mut selection = lock(&self.shared.selection);
        *selection = Selection::default();
        self.shared.compressor.validate_input(&image)?;
        selection.image = Some(Arc::new(image));
        Ok(())
    }

    pub fn clear(&self) {
        self.invalidate();
        *lock(&self.shared.selection) = Selection::default();
    }

    /// Whether a decoded frame is cached for the selected image.
    pub fn has_cached_frame(&self) -> bool {
        lock(&self.shared.selection).frame.is_some()
    }

    /// Queue a compression at `quality`, superseding any pending request.
    ///
    /// Returns the generation assigned to this request.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit<E>(&self, quality: QualityRequest, encoder: Arc<E>) -> u64
    where
        E: EncoderBackend + Send + Sync + ?Sized + 'static,
    {
        let generation = self.shared.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let shared = Arc::clone(&self.shared);
        let results = Arc::clone(&self.results);

        let task = tokio::spawn(async move {
            tokio::time::sleep(shared.debounce).await;
            if !shared.is_latest(generation) {
                return;
            }

            let worker = Arc::clone(&shared);
            let joined =
                tokio::task::spawn_blocking(move || worker.run(quality, encoder.as_ref())).await;
            let outcome = match joined {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::warn!("Compression request {} did not complete: {}", generation, err);
                    return;
                }
            };

            let result = ScheduledResult {
                generation,
                outcome,
            };
            let committed = results.send_if_modified(|current| {
                commit_if_current(current, shared.latest_generation(), result)
            });
            if !committed {
                log::debug!("Discarded stale result for request {}", generation);
            }
        });

        if let Some(previous) = lock(&self.pending).replace(task) {
            previous.abort();
        }
        generation
    }

    /// Receiver for committed results.
    pub fn subscribe(&self) -> watch::Receiver<Option<ScheduledResult>> {
        self.results.subscribe()
    }

    /// Most recently committed result, if any.
    pub fn latest(&self) -> Option<ScheduledResult> {
        self.results.borrow().clone()
    }

    fn invalidate(&self) {
        self.shared.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(pending) = lock(&self.pending).take() {
            pending.abort();
        }
    }
}

impl<D> Drop for RequestScheduler<D> {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.pending).take() {
            pending.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::decode::DecodeError;
    use crate::pixels::PixelBuffer;
    use crate::probe::fixtures::png_header;
    use crate::testing::{FakeDecoder, RecordingEncoder};
    use crate::types::{ContentKind, Dimensions};
    use tokio::time::{sleep, timeout};

    /// Holds each decode for `delay` before delegating.
    #[derive(Debug, Clone)]
    struct SlowDecoder {
        inner: FakeDecoder,
        delay: Duration,
    }

    impl RasterDecoder for SlowDecoder {
        fn decode_at(
            &self,
            bytes: &[u8],
            source: Dimensions,
            target: Dimensions,
        ) -> Result<PixelBuffer, DecodeError> {
            std::thread::sleep(self.delay);
            self.inner.decode_at(bytes, source, target)
        }
    }

    fn scheduler<D: RasterDecoder + Send + Sync + 'static>(
        decoder: D,
        debounce_ms: u64,
    ) -> RequestScheduler<D> {
        let mut config = PipelineConfig::default();
        config.debounce_ms = debounce_ms;
        let compressor = Compressor::with_decoder(config, decoder).unwrap();
        RequestScheduler::new(compressor)
    }

    fn header_only(width: u32, height: u32) -> CompressedImage {
        CompressedImage::new(png_header(width, height), ContentKind::Png)
    }

    async fn next_result<D>(scheduler: &RequestScheduler<D>) -> ScheduledResult
    where
        D: RasterDecoder + Send + Sync + 'static,
    {
        let mut rx = scheduler.subscribe();
        let result = timeout(Duration::from_secs(5), rx.wait_for(Option::is_some))
            .await
            .expect("no result committed")
            .unwrap();
        result.clone().unwrap()
    }

    fn stub_result(generation: u64) -> ScheduledResult {
        ScheduledResult {
            generation,
            outcome: Err(PipelineError::NoImageSelected),
        }
    }

    #[test]
    fn test_commit_if_current() {
        let mut slot = None;
        assert!(commit_if_current(&mut slot, 3, stub_result(3)));
        assert_eq!(slot.as_ref().map(|r| r.generation), Some(3));

        // Superseded after its work finished
        assert!(!commit_if_current(&mut slot, 5, stub_result(4)));
        assert_eq!(slot.as_ref().map(|r| r.generation), Some(3));

        assert!(commit_if_current(&mut slot, 5, stub_result(5)));
        assert_eq!(slot.as_ref().map(|r| r.generation), Some(5));
    }

    #[test]
    fn test_commit_never_replaces_newer_result() {
        let mut slot = Some(stub_result(7));
        assert!(!commit_if_current(&mut slot, 7, stub_result(7)));
        assert!(!commit_if_current(&mut slot, 6, stub_result(6)));
        assert_eq!(slot, Some(stub_result(7)));
    }

    #[tokio::test]
    async fn test_rapid_submissions_coalesce() {
        let decoder = FakeDecoder::succeeding();
        let scheduler = scheduler(decoder.clone(), 30);
        let encoder = Arc::new(RecordingEncoder::rgb_only());
        scheduler.select(header_only(640, 480)).unwrap();

        for quality in [0.3, 0.5, 0.7] {
            scheduler.submit(QualityRequest::new(quality).unwrap(), Arc::clone(&encoder));
        }

        let result = next_result(&scheduler).await;
        assert_eq!(result.generation, scheduler.generation());
        assert!(result.outcome.is_ok());

        sleep(Duration::from_millis(100)).await;
        assert_eq!(decoder.requested().len(), 1);
        assert_eq!(encoder.seen().len(), 1);
    }

    #[tokio::test]
    async fn test_stale_in_flight_result_is_dropped() {
        let decoder = SlowDecoder {
            inner: FakeDecoder::succeeding(),
            delay: Duration::from_millis(150),
        };
        let scheduler = scheduler(decoder, 5);
        let encoder = Arc::new(RecordingEncoder::rgb_only());
        scheduler.select(header_only(64, 64)).unwrap();

        let first = scheduler.submit(QualityRequest::new(0.2).unwrap(), Arc::clone(&encoder));
        // Let the first request get past the debounce and into the decoder.
        sleep(Duration::from_millis(50)).await;
        let second = scheduler.submit(QualityRequest::new(0.9).unwrap(), Arc::clone(&encoder));

        let result = next_result(&scheduler).await;
        assert_eq!(result.generation, second);

        sleep(Duration::from_millis(300)).await;
        let latest = scheduler.latest().unwrap();
        assert_ne!(latest.generation, first);
        assert_eq!(latest.generation, second);
    }

    #[tokio::test]
    async fn test_select_invalidates_pending_request() {
        let decoder = FakeDecoder::succeeding();
        let scheduler = scheduler(decoder.clone(), 30);
        let encoder = Arc::new(RecordingEncoder::rgb_only());

        scheduler.select(header_only(640, 480)).unwrap();
        scheduler.submit(QualityRequest::MAX, Arc::clone(&encoder));
        scheduler.select(header_only(320, 240)).unwrap();

        sleep(Duration::from_millis(100)).await;
        assert!(scheduler.latest().is_none());
        assert!(decoder.requested().is_empty());

        scheduler.submit(QualityRequest::MAX, Arc::clone(&encoder));
        let result = next_result(&scheduler).await;
        let compressed = result.outcome.unwrap();
        assert_eq!(compressed.dimensions(), Dimensions::new(320, 240).unwrap());
    }

    #[tokio::test]
    async fn test_frame_cached_between_requests() {
        let decoder = FakeDecoder::succeeding();
        let scheduler = scheduler(decoder.clone(), 1);
        let encoder = Arc::new(RecordingEncoder::rgb_only());
        scheduler.select(header_only(200, 100)).unwrap();

        let first = scheduler.submit(QualityRequest::new(0.4).unwrap(), Arc::clone(&encoder));
        let mut rx = scheduler.subscribe();
        timeout(
            Duration::from_secs(5),
            rx.wait_for(|r| r.as_ref().is_some_and(|r| r.generation == first)),
        )
        .await
        .unwrap()
        .unwrap();
        assert!(scheduler.has_cached_frame());

        let second = scheduler.submit(QualityRequest::new(0.8).unwrap(), Arc::clone(&encoder));
        timeout(
            Duration::from_secs(5),
            rx.wait_for(|r| r.as_ref().is_some_and(|r| r.generation == second)),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(decoder.requested().len(), 1);
        assert_eq!(encoder.seen().len(), 2);
    }

    #[tokio::test]
    async fn test_submit_without_image() {
        let scheduler = scheduler(FakeDecoder::succeeding(), 1);
        scheduler.submit(QualityRequest::MAX, Arc::new(RecordingEncoder::rgb_only()));

        let result = next_result(&scheduler).await;
        assert_eq!(result.outcome, Err(PipelineError::NoImageSelected));
    }

    #[tokio::test]
    async fn test_rejected_select_clears_selection() {
        let decoder = FakeDecoder::succeeding();
        let mut config = PipelineConfig::default();
        config.allowed_kinds = vec![ContentKind::Png];
        let scheduler = RequestScheduler::new(Compressor::with_decoder(config, decoder).unwrap());

        scheduler.select(header_only(10, 10)).unwrap();
        let jpeg = CompressedImage::new(vec![0xFF, 0xD8], ContentKind::Jpeg);
        assert!(matches!(
            scheduler.select(jpeg),
            Err(PipelineError::UnsupportedContentKind(_))
        ));
        assert!(!scheduler.has_cached_frame());
    }
}
