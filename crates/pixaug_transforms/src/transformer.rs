//! The data transformer: gate, augment, crop and pack.

use image::DynamicImage;
use ndarray::{Array4, ArrayView4, ArrayViewMut3};
use pixaug_core::{alloc_blob, AugmentError, BlobShape, Phase, RandomSource, Result, Seed};
use serde::{Deserialize, Serialize};

use crate::config::TransformConfig;
use crate::datum::Datum;
use crate::erase::{random_erase, EraseParams, EraseRect};
use crate::frame::Frame;
use crate::gate::{GateDecisions, GateEvaluator};
use crate::geometric::{
    affine_warp, ensure_fits, min_side_range_crop, random_crop, resize_to, rotate_expand,
    sample_angle, AffineParams, CropOffset, MinSideRange,
};
use crate::mean::{MeanMap, MeanModel, MeanValues};
use crate::packer::{CropWindow, Packer, PixelSource};
use crate::photometric::{color_shift, contrast_brightness, ColorShift, ContrastBrightness};
use crate::shape::ShapeInferencer;
use crate::smooth::{smooth, SmoothParams};

/// A sampled min-side crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MinSideCrop {
    /// Side of the square crop.
    pub side: usize,
    /// Crop offset in the (possibly resized) frame.
    pub offset: CropOffset,
}

/// Magnitudes sampled for the transforms that fired.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SampledParams {
    /// Erased rectangle; `None` when erasing did not fire or did not fit.
    pub erase: Option<EraseRect>,
    /// Colour shift.
    pub color_shift: Option<ColorShift>,
    /// Contrast and brightness.
    pub contrast: Option<ContrastBrightness>,
    /// Smoothing kernel.
    pub smooth: Option<SmoothParams>,
    /// Min-side or min-side-range crop.
    pub min_side_crop: Option<MinSideCrop>,
    /// Affine warp.
    pub affine: Option<AffineParams>,
    /// Rotation angle in degrees, zero included.
    pub rotation_angle: Option<i32>,
}

/// Everything decided during one transform call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AugmentationRecord {
    /// Gate decisions, mirror included.
    pub gates: GateDecisions,
    /// Sampled magnitudes.
    pub params: SampledParams,
    /// Final crop window in the canonical frame.
    pub crop: CropWindow,
}

impl AugmentationRecord {
    /// Whether the packed output was mirrored.
    #[must_use]
    pub const fn mirrored(&self) -> bool {
        self.gates.mirror
    }
}

/// Seeded augmentation-and-packing pipeline for one worker.
///
/// The configuration and mean model are fixed at construction. The random
/// source is the only state that changes between calls, so one instance
/// must not be shared between threads; use [`DataTransformer::for_worker`]
/// to give each worker its own reproducible stream.
///
/// # Example
///
/// ```rust
/// use image::{DynamicImage, RgbImage};
/// use ndarray::Array3;
/// use pixaug_core::{Phase, Seed};
/// use pixaug_transforms::{DataTransformer, TransformConfig};
///
/// let config = TransformConfig {
///     crop_size: 32,
///     mirror: true,
///     ..Default::default()
/// };
/// let mut transformer = DataTransformer::new(config, Phase::Train)
///     .unwrap()
///     .with_seed(Seed::new(7));
///
/// let image = DynamicImage::ImageRgb8(RgbImage::new(48, 40));
/// let mut out = Array3::<f32>::zeros((3, 32, 32));
/// let record = transformer.transform_image(&image, &mut out.view_mut()).unwrap();
/// assert_eq!(record.crop.height, 32);
/// ```
#[derive(Debug, Clone)]
pub struct DataTransformer {
    config: TransformConfig,
    phase: Phase,
    mean: MeanModel,
    seed: Seed,
    rng: RandomSource,
}

impl DataTransformer {
    /// Validate `config`, load its mean source and seed from entropy.
    ///
    /// # Errors
    ///
    /// - [`AugmentError::ConfigurationConflict`] for conflicting parameters
    /// - I/O or serialization errors while loading `mean_file`
    pub fn new(config: TransformConfig, phase: Phase) -> Result<Self> {
        config.validate()?;
        let mean = if let Some(path) = &config.mean_file {
            MeanModel::Dense(MeanMap::load(path)?)
        } else if !config.mean_value.is_empty() {
            MeanModel::Values(MeanValues::new(config.mean_value.clone())?)
        } else {
            MeanModel::None
        };
        Ok(Self::build(config, phase, mean))
    }

    /// Like [`DataTransformer::new`] with an in-memory dense mean.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ConfigurationConflict`] when `config` also
    /// names a mean file or mean values.
    pub fn with_mean_map(config: TransformConfig, phase: Phase, map: MeanMap) -> Result<Self> {
        config.validate()?;
        if config.mean_file.is_some() || !config.mean_value.is_empty() {
            return Err(AugmentError::conflict(
                "a mean map cannot be combined with mean_file or mean_value",
            ));
        }
        Ok(Self::build(config, phase, MeanModel::Dense(map)))
    }

    fn build(config: TransformConfig, phase: Phase, mean: MeanModel) -> Self {
        let seed = Seed::from_entropy();
        let rng = Self::source_for(&config, phase, seed);
        tracing::info!(
            %phase,
            mean = %mean.describe(),
            randomized = rng.is_available(),
            "data transformer ready"
        );
        Self {
            config,
            phase,
            mean,
            seed,
            rng,
        }
    }

    /// Whether a transformer with this configuration ever draws.
    #[must_use]
    pub fn needs_random(config: &TransformConfig, phase: Phase) -> bool {
        config.mirror
            || (phase.is_train() && config.crop_size > 0)
            || (phase.is_train() && config.has_augmentation())
    }

    fn source_for(config: &TransformConfig, phase: Phase, seed: Seed) -> RandomSource {
        if Self::needs_random(config, phase) {
            RandomSource::seeded(seed)
        } else {
            RandomSource::disabled()
        }
    }

    /// Reseed the random source. Has no effect on transformers that never
    /// draw.
    #[must_use]
    pub fn with_seed(mut self, seed: Seed) -> Self {
        self.seed = seed;
        self.rng = Self::source_for(&self.config, self.phase, seed);
        self
    }

    /// An independent copy for worker `worker`, seeded from this
    /// transformer's seed.
    #[must_use]
    pub fn for_worker(&self, worker: usize) -> Self {
        let seed = self.seed.derive(&format!("worker-{worker}"));
        Self {
            config: self.config.clone(),
            phase: self.phase,
            mean: self.mean.clone(),
            seed,
            rng: Self::source_for(&self.config, self.phase, seed),
        }
    }

    /// The configuration.
    #[must_use]
    pub const fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// The phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// The mean model.
    #[must_use]
    pub const fn mean(&self) -> &MeanModel {
        &self.mean
    }

    /// The current seed.
    #[must_use]
    pub const fn seed(&self) -> Seed {
        self.seed
    }

    /// The random source, for inspecting draw counts.
    #[must_use]
    pub const fn random_source(&self) -> &RandomSource {
        &self.rng
    }

    fn inferencer(&self) -> ShapeInferencer {
        ShapeInferencer::new(self.config.crop_size, self.config.color_mode())
    }

    fn packer(&self) -> Packer<'_> {
        Packer::new(&self.mean, self.config.scale)
    }

    /// Augment, crop, mirror and pack one decoded image into `dst`
    /// (`C x H x W`).
    ///
    /// # Errors
    ///
    /// - [`AugmentError::InvalidPixelDepth`] for a non-8-bit image
    /// - [`AugmentError::InsufficientSourceDimensions`] when the crop does not fit
    /// - [`AugmentError::ShapeMismatch`] when `dst` or the mean does not fit
    ///
    /// Every check runs before the first draw, so a failed call leaves both
    /// `dst` and the random source untouched.
    pub fn transform_image(
        &mut self,
        image: &DynamicImage,
        dst: &mut ArrayViewMut3<'_, f32>,
    ) -> Result<AugmentationRecord> {
        let frame = Frame::from_dynamic(image.clone())?;
        self.transform_frame(frame, dst)
    }

    /// Like [`DataTransformer::transform_image`] for an owned frame.
    pub fn transform_frame(
        &mut self,
        frame: Frame,
        dst: &mut ArrayViewMut3<'_, f32>,
    ) -> Result<AugmentationRecord> {
        self.check_frame(&frame, dst.dim())?;
        self.pack_frame(frame, dst)
    }

    /// Transform a batch of images into `dst`, one item per image.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] for an empty batch or when the
    /// batch size differs from `dst`'s first dimension. Every item is
    /// checked before any is packed.
    pub fn transform_images(
        &mut self,
        images: &[DynamicImage],
        dst: &mut Array4<f32>,
    ) -> Result<Vec<AugmentationRecord>> {
        if images.is_empty() {
            return Err(AugmentError::shape("there is no image to add"));
        }
        let num = dst.dim().0;
        if images.len() != num {
            return Err(AugmentError::shape(format!(
                "the number of images ({}) must equal the destination num ({num})",
                images.len()
            )));
        }
        let item = item_dims(dst);
        let frames = images
            .iter()
            .map(|image| Frame::from_dynamic(image.clone()))
            .collect::<Result<Vec<_>>>()?;
        for frame in &frames {
            self.check_frame(frame, item)?;
        }

        let mut records = Vec::with_capacity(frames.len());
        for (frame, mut slot) in frames.into_iter().zip(dst.outer_iter_mut()) {
            records.push(self.pack_frame(frame, &mut slot)?);
        }
        Ok(records)
    }

    fn check_frame(&self, frame: &Frame, dst: (usize, usize, usize)) -> Result<()> {
        if self.phase.is_train() && self.config.min_side > 0 {
            let (width, height) = frame.dimensions();
            ensure_fits(self.config.min_side, height as usize, width as usize)?;
        }
        self.check_source(frame, dst)
    }

    /// Shape checks shared by every path, done before any draw.
    fn check_source<S: PixelSource + ?Sized>(
        &self,
        source: &S,
        dst: (usize, usize, usize),
    ) -> Result<()> {
        source.check()?;
        let (height, width) = (source.height(), source.width());
        let crop = self.config.crop_size;
        ensure_fits(crop, height, width)?;
        let window = if crop > 0 {
            CropWindow::centered(crop, height, width)
        } else {
            CropWindow::full(height, width)
        };
        self.packer().check(source, &window, dst)
    }

    fn pack_frame(
        &mut self,
        frame: Frame,
        dst: &mut ArrayViewMut3<'_, f32>,
    ) -> Result<AugmentationRecord> {
        let (width, height) = frame.dimensions();
        let evaluator = GateEvaluator::new(&self.config, self.phase);
        let mirror = evaluator.mirror(&mut self.rng)?;
        let mut gates = evaluator.evaluate(&mut self.rng)?;
        gates.mirror = mirror;

        let (frame, params) = self.run_augmentations(frame, &gates)?;
        let crop = self.crop_window(height as usize, width as usize)?;
        let record = AugmentationRecord {
            gates,
            params,
            crop,
        };
        self.log_record(&record);

        self.packer().pack(&frame, &crop, mirror, dst)?;
        Ok(record)
    }

    /// Steps 1 to 8: erase, colour shift, contrast, smooth, min-side crop,
    /// affine or rotation, then resize back to the input size.
    fn run_augmentations(
        &mut self,
        frame: Frame,
        gates: &GateDecisions,
    ) -> Result<(Frame, SampledParams)> {
        let config = &self.config;
        let rng = &mut self.rng;
        let (width, height) = frame.dimensions();
        let mut params = SampledParams::default();
        let mut frame = frame;

        if gates.random_erasing {
            let erase = EraseParams {
                low: config.random_erasing_low,
                high: config.random_erasing_high,
                ratio: config.random_erasing_ratio,
            };
            let (out, rect) = random_erase(frame, erase, rng)?;
            frame = out;
            params.erase = rect;
        }

        if gates.color_shift {
            let shift = ColorShift::sample(config.max_color_shift, rng)?;
            frame = color_shift(frame, shift);
            params.color_shift = Some(shift);
        }

        if gates.brightness {
            let cb = ContrastBrightness::sample(
                config.min_contrast,
                config.max_contrast,
                config.max_brightness_shift,
                rng,
            )?;
            frame = contrast_brightness(frame, cb);
            params.contrast = Some(cb);
        }

        if gates.smooth {
            let sp = SmoothParams::sample(config.max_smooth, rng)?;
            frame = smooth(frame, sp);
            params.smooth = Some(sp);
        }

        if gates.min_side {
            let (out, offset) = random_crop(&frame, config.min_side, rng)?;
            frame = out;
            params.min_side_crop = Some(MinSideCrop {
                side: config.min_side,
                offset,
            });
        } else if gates.min_side_range {
            let range = MinSideRange {
                min: config.min_side_min,
                max: config.min_side_max,
            };
            let (out, side, offset) = min_side_range_crop(&frame, range, rng)?;
            frame = out;
            params.min_side_crop = Some(MinSideCrop { side, offset });
        }

        if gates.affine {
            let affine = AffineParams::sample(
                config.max_rotation_angle,
                config.affine_min_scale,
                config.affine_max_scale,
                rng,
            )?;
            frame = affine_warp(&frame, affine);
            params.affine = Some(affine);
        } else if gates.rotation {
            let angle = sample_angle(config.max_rotation_angle, rng)?;
            frame = rotate_expand(&frame, angle);
            params.rotation_angle = Some(angle);
        }

        if frame.dimensions() != (width, height) {
            frame = resize_to(&frame, width, height);
        }
        Ok((frame, params))
    }

    /// Final crop window: random in train, centred in test, full without a
    /// crop size.
    fn crop_window(&mut self, height: usize, width: usize) -> Result<CropWindow> {
        let crop = self.config.crop_size;
        if crop == 0 {
            return Ok(CropWindow::full(height, width));
        }
        if self.phase.is_test() {
            return Ok(CropWindow::centered(crop, height, width));
        }
        let h_off = self.rng.index(height - crop + 1)?;
        let w_off = self.rng.index(width - crop + 1)?;
        Ok(CropWindow {
            h_off,
            w_off,
            height: crop,
            width: crop,
        })
    }

    fn log_record(&self, record: &AugmentationRecord) {
        if !(self.config.debug_params && self.phase.is_train()) {
            tracing::debug!(
                mirror = record.gates.mirror,
                h_off = record.crop.h_off,
                w_off = record.crop.w_off,
                "packed sample"
            );
            return;
        }
        let p = &record.params;
        let g = &record.gates;
        tracing::info!("----------------------------------------");
        if let Some(sp) = p.smooth {
            tracing::info!(kind = ?sp.kind, size = sp.size, "smooth filtering");
        }
        if let Some(angle) = p.rotation_angle {
            tracing::info!(angle, "rotation");
        }
        if let Some(cb) = p.contrast {
            tracing::info!(alpha = cb.alpha, beta = cb.beta, "contrast adjustment");
        }
        if let Some(cs) = p.color_shift {
            tracing::info!(shifts = ?cs.shifts, subtract = cs.subtract, "color shift");
        }
        if let Some(crop) = p.min_side_crop {
            if g.min_side_range {
                tracing::info!(
                    min_side_min = self.config.min_side_min,
                    min_side_max = self.config.min_side_max,
                    side = crop.side,
                    "min_side_min_max crop"
                );
            } else {
                tracing::info!(min_side = crop.side, "min_side crop");
            }
        }
        if let Some(a) = p.affine {
            tracing::info!(
                angle = a.angle,
                scale = a.scale,
                scale_x = a.scale_x,
                scale_y = a.scale_y,
                "affine transformation"
            );
        }
        if g.random_erasing {
            match p.erase {
                Some(r) => tracing::info!(
                    x = r.x,
                    y = r.y,
                    width = r.width,
                    height = r.height,
                    "random erasing"
                ),
                None => tracing::info!("random erasing skipped: rectangle does not fit"),
            }
        }
        tracing::info!(
            mirror = g.mirror,
            h_off = record.crop.h_off,
            w_off = record.crop.w_off,
            "crop"
        );
    }

    /// Transform one stored sample into `dst`.
    ///
    /// Encoded datums are decoded (honouring `force_color` / `force_gray`)
    /// and take the full image path. Raw datums are only cropped, mirrored
    /// and normalized.
    pub fn transform_datum(
        &mut self,
        datum: &Datum,
        dst: &mut ArrayViewMut3<'_, f32>,
    ) -> Result<AugmentationRecord> {
        match self.prepare_datum(datum)? {
            Prepared::Frame(frame) => self.transform_frame(frame, dst),
            Prepared::Raw(raw) => {
                self.check_source(raw, dst.dim())?;
                self.pack_raw(raw, dst)
            }
        }
    }

    /// Transform up to `dst.num` datums; trailing items of `dst` are left
    /// untouched.
    ///
    /// # Errors
    ///
    /// Returns [`AugmentError::ShapeMismatch`] for an empty batch or one
    /// larger than `dst`. Every item is checked before any is packed.
    pub fn transform_datums(
        &mut self,
        datums: &[Datum],
        dst: &mut Array4<f32>,
    ) -> Result<Vec<AugmentationRecord>> {
        if datums.is_empty() {
            return Err(AugmentError::shape("there is no datum to add"));
        }
        let num = dst.dim().0;
        if datums.len() > num {
            return Err(AugmentError::shape(format!(
                "the number of datums ({}) must be no greater than the destination num ({num})",
                datums.len()
            )));
        }
        let item = item_dims(dst);
        let prepared = datums
            .iter()
            .map(|d| self.prepare_datum(d))
            .collect::<Result<Vec<_>>>()?;
        for p in &prepared {
            match p {
                Prepared::Frame(frame) => self.check_frame(frame, item)?,
                Prepared::Raw(raw) => self.check_source(*raw, item)?,
            }
        }

        let mut records = Vec::with_capacity(prepared.len());
        for (p, mut slot) in prepared.into_iter().zip(dst.outer_iter_mut()) {
            let record = match p {
                Prepared::Frame(frame) => self.pack_frame(frame, &mut slot)?,
                Prepared::Raw(raw) => self.pack_raw(raw, &mut slot)?,
            };
            records.push(record);
        }
        Ok(records)
    }

    fn prepare_datum<'d>(&self, datum: &'d Datum) -> Result<Prepared<'d>> {
        if datum.encoded {
            return Ok(Prepared::Frame(datum.decode(self.config.color_mode())?));
        }
        if self.config.force_color || self.config.force_gray {
            tracing::warn!("force_color and force_gray only apply to encoded datums");
        }
        Ok(Prepared::Raw(datum))
    }

    fn pack_raw<S: PixelSource + ?Sized>(
        &mut self,
        source: &S,
        dst: &mut ArrayViewMut3<'_, f32>,
    ) -> Result<AugmentationRecord> {
        let mirror = GateEvaluator::new(&self.config, self.phase).mirror(&mut self.rng)?;
        let crop = self.crop_window(source.height(), source.width())?;
        self.packer().pack(source, &crop, mirror, dst)?;
        Ok(AugmentationRecord {
            gates: GateDecisions {
                mirror,
                ..Default::default()
            },
            crop,
            ..Default::default()
        })
    }

    /// Crop, mirror and normalize a `(N, C, H, W)` tensor into `dst`.
    ///
    /// One mirror decision and one crop window apply to the whole batch. An
    /// empty `dst` is replaced by a zeroed tensor of the inferred shape.
    pub fn transform_blob(
        &mut self,
        input: &ArrayView4<'_, f32>,
        dst: &mut Array4<f32>,
    ) -> Result<AugmentationRecord> {
        let (n, channels, height, width) = input.dim();
        let crop = self.config.crop_size;
        ensure_fits(crop, height, width)?;
        if dst.is_empty() {
            let shape = if crop > 0 {
                BlobShape::new(n, channels, crop, crop)
            } else {
                BlobShape::new(n, channels, height, width)
            };
            *dst = alloc_blob(shape);
        }
        let num = dst.dim().0;
        if n > num {
            return Err(AugmentError::shape(format!(
                "input num ({n}) exceeds the destination num ({num})"
            )));
        }
        let item = item_dims(dst);
        for view in input.outer_iter() {
            self.check_source(&view, item)?;
        }

        let mirror = GateEvaluator::new(&self.config, self.phase).mirror(&mut self.rng)?;
        let window = self.crop_window(height, width)?;
        let packer = self.packer();
        for (view, mut slot) in input.outer_iter().zip(dst.outer_iter_mut()) {
            packer.pack(&view, &window, mirror, &mut slot)?;
        }
        Ok(AugmentationRecord {
            gates: GateDecisions {
                mirror,
                ..Default::default()
            },
            crop: window,
            ..Default::default()
        })
    }

    /// Apply the gated augmentations to a frame without cropping,
    /// mirroring or packing. The result has the input's dimensions.
    pub fn augment(&mut self, frame: Frame) -> Result<(Frame, AugmentationRecord)> {
        let (width, height) = frame.dimensions();
        if self.phase.is_train() && self.config.min_side > 0 {
            ensure_fits(self.config.min_side, height as usize, width as usize)?;
        }
        let gates = GateEvaluator::new(&self.config, self.phase).evaluate(&mut self.rng)?;
        let (frame, params) = self.run_augmentations(frame, &gates)?;
        let record = AugmentationRecord {
            gates,
            params,
            crop: CropWindow::full(height as usize, width as usize),
        };
        self.log_record(&record);
        Ok((frame, record))
    }

    /// [`DataTransformer::augment`] for a stored sample. The result is a raw
    /// byte datum carrying the input's label.
    pub fn augment_datum(&mut self, datum: &Datum) -> Result<(Datum, AugmentationRecord)> {
        let frame = if datum.encoded {
            datum.decode(self.config.color_mode())?
        } else {
            datum.to_frame()?
        };
        let (frame, record) = self.augment(frame)?;
        Ok((Datum::from_frame(&frame).with_label(datum.label), record))
    }

    /// Packed shape of one image.
    pub fn infer_shape(&self, image: &DynamicImage) -> Result<BlobShape> {
        self.inferencer().image(image)
    }

    /// Packed shape of a batch of images.
    pub fn infer_shape_images(&self, images: &[DynamicImage]) -> Result<BlobShape> {
        self.inferencer().images(images)
    }

    /// Packed shape of one frame.
    pub fn infer_shape_frame(&self, frame: &Frame) -> Result<BlobShape> {
        self.inferencer().frame(frame)
    }

    /// Packed shape of one datum.
    pub fn infer_shape_datum(&self, datum: &Datum) -> Result<BlobShape> {
        self.inferencer().datum(datum)
    }

    /// Packed shape of a batch of datums.
    pub fn infer_shape_datums(&self, datums: &[Datum]) -> Result<BlobShape> {
        self.inferencer().datums(datums)
    }
}

enum Prepared<'d> {
    Frame(Frame),
    Raw(&'d Datum),
}

fn item_dims(blob: &Array4<f32>) -> (usize, usize, usize) {
    let (_, c, h, w) = blob.dim();
    (c, h, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use ndarray::Array3;

    fn rgb(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
        }))
    }

    #[test]
    fn test_random_source_requirement() {
        let plain = TransformConfig::default();
        assert!(!DataTransformer::needs_random(&plain, Phase::Train));

        let cropped = TransformConfig {
            crop_size: 8,
            ..Default::default()
        };
        assert!(DataTransformer::needs_random(&cropped, Phase::Train));
        assert!(!DataTransformer::needs_random(&cropped, Phase::Test));

        let mirrored = TransformConfig {
            mirror: true,
            ..Default::default()
        };
        assert!(DataTransformer::needs_random(&mirrored, Phase::Test));

        let rotating = TransformConfig {
            max_rotation_angle: 5,
            ..Default::default()
        };
        assert!(DataTransformer::needs_random(&rotating, Phase::Train));
    }

    #[test]
    fn test_test_phase_identity_without_draws() {
        let mut transformer =
            DataTransformer::new(TransformConfig::default(), Phase::Test).unwrap();
        assert!(!transformer.random_source().is_available());

        let image = rgb(5, 4);
        let mut out = Array3::<f32>::zeros((3, 4, 5));
        let record = transformer
            .transform_image(&image, &mut out.view_mut())
            .unwrap();
        assert!(!record.mirrored());
        let raw = image.to_rgb8();
        for c in 0..3 {
            for h in 0..4 {
                for w in 0..5 {
                    let px = raw.get_pixel(w as u32, h as u32)[c];
                    assert_eq!(out[[c, h, w]], f32::from(px));
                }
            }
        }
        assert_eq!(transformer.random_source().draws(), 0);
    }

    #[test]
    fn test_checks_precede_draws() {
        let config = TransformConfig {
            crop_size: 10,
            mirror: true,
            ..Default::default()
        };
        let mut transformer = DataTransformer::new(config, Phase::Train)
            .unwrap()
            .with_seed(Seed::new(1));
        let mut out = Array3::<f32>::from_elem((3, 10, 10), -1.0);
        let err = transformer
            .transform_image(&rgb(8, 20), &mut out.view_mut())
            .unwrap_err();
        assert!(matches!(
            err,
            AugmentError::InsufficientSourceDimensions { required: 10, .. }
        ));
        assert_eq!(transformer.random_source().draws(), 0);
        assert!(out.iter().all(|&v| v == -1.0));

        let mut wrong = Array3::<f32>::zeros((1, 10, 10));
        assert!(matches!(
            transformer.transform_image(&rgb(12, 12), &mut wrong.view_mut()),
            Err(AugmentError::ShapeMismatch(_))
        ));
        assert_eq!(transformer.random_source().draws(), 0);
    }

    #[test]
    fn test_with_mean_map_conflicts_with_values() {
        let config = TransformConfig {
            mean_value: vec![1.0],
            ..Default::default()
        };
        let map = MeanMap::new(1, 1, 1, vec![0.0]).unwrap();
        assert!(matches!(
            DataTransformer::with_mean_map(config, Phase::Train, map),
            Err(AugmentError::ConfigurationConflict(_))
        ));
    }

    #[test]
    fn test_augment_keeps_dimensions() {
        let config = TransformConfig {
            apply_probability: 1.0,
            max_rotation_angle: 20,
            min_side_min: 20,
            min_side_max: 30,
            max_color_shift: 10,
            ..Default::default()
        };
        let mut transformer = DataTransformer::new(config, Phase::Train)
            .unwrap()
            .with_seed(Seed::new(99));
        let frame = Frame::from_dynamic(rgb(48, 36)).unwrap();
        for _ in 0..5 {
            let (out, record) = transformer.augment(frame.clone()).unwrap();
            assert_eq!(out.dimensions(), (48, 36));
            assert!(record.gates.min_side_range);
            assert!(record.params.min_side_crop.is_some());
        }
    }

    #[test]
    fn test_affine_takes_precedence_over_rotation() {
        let config = TransformConfig {
            apply_probability: 1.0,
            max_rotation_angle: 15,
            affine_min_scale: 0.9,
            affine_max_scale: 1.1,
            ..Default::default()
        };
        let mut transformer = DataTransformer::new(config, Phase::Train)
            .unwrap()
            .with_seed(Seed::new(5));
        let frame = Frame::from_dynamic(rgb(40, 30)).unwrap();
        for _ in 0..5 {
            let (out, record) = transformer.augment(frame.clone()).unwrap();
            assert!(record.gates.affine && record.gates.rotation);
            assert!(record.params.affine.is_some());
            assert!(record.params.rotation_angle.is_none());
            assert_eq!(out.dimensions(), (40, 30));
        }
    }

    #[test]
    fn test_augment_datum_keeps_label() {
        let config = TransformConfig {
            apply_probability: 1.0,
            max_color_shift: 30,
            ..Default::default()
        };
        let mut transformer = DataTransformer::new(config, Phase::Train)
            .unwrap()
            .with_seed(Seed::new(3));
        let frame = Frame::Gray(GrayImage::from_pixel(6, 5, Luma([100])));
        let datum = Datum::from_frame(&frame).with_label(4);
        let (out, record) = transformer.augment_datum(&datum).unwrap();
        assert_eq!(out.label, 4);
        assert_eq!((out.channels, out.height, out.width), (1, 5, 6));
        assert!(record.params.color_shift.is_some());
    }

    #[test]
    fn test_worker_streams_differ_and_repeat() {
        let config = TransformConfig {
            crop_size: 4,
            ..Default::default()
        };
        let base = DataTransformer::new(config, Phase::Train)
            .unwrap()
            .with_seed(Seed::new(10));
        let image = rgb(32, 32);
        let run = |mut t: DataTransformer| {
            let mut out = Array3::<f32>::zeros((3, 4, 4));
            (0..8)
                .map(|_| t.transform_image(&image, &mut out.view_mut()).unwrap().crop)
                .collect::<Vec<_>>()
        };
        assert_eq!(run(base.for_worker(0)), run(base.for_worker(0)));
        assert_ne!(run(base.for_worker(0)), run(base.for_worker(1)));
    }
}
