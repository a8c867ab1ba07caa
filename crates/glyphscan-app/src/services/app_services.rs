// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads the config and reference store from the data
// directory and runs the pipeline on behalf of the command-line front end.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use glyphscan_core::OcrConfig;
use glyphscan_core::error::{GlyphscanError, Result};
use glyphscan_document::{
    CharWidthTracker, Document, GrayBuffer, Pipeline, ReferenceStore, Segmenter, labels_from_text,
};
use glyphscan_platform::platform_allocator;
use image::ImageFormat;
use tracing::{info, warn};

use super::data_dir;

const CONFIG_FILE: &str = "config.json";

/// Everything a command needs: configuration, the pipeline and the store.
pub struct AppServices {
    data_dir: PathBuf,
    pipeline: Pipeline,
    store: ReferenceStore,
}

impl AppServices {
    /// Initialise from the default data directory.
    pub fn init() -> Result<Self> {
        Self::init_in(data_dir::data_dir())
    }

    /// Initialise from `dir`. A missing config is written out with defaults
    /// so it can be edited; a broken one falls back to defaults.
    pub fn init_in(dir: PathBuf) -> Result<Self> {
        let config = match load_config(&dir) {
            Some(config) => config,
            None => {
                let config = OcrConfig::default();
                if let Err(err) = persist_config(&dir, &config) {
                    warn!(error = %err, "could not write default config");
                }
                config
            }
        };

        let store_path = data_dir::resolve(&dir, &config.reference_store_path);
        let store = ReferenceStore::open(&store_path);
        let pipeline = Pipeline::new(config, platform_allocator())?;

        info!(
            data_dir = %dir.display(),
            references = store.len(),
            allocator = pipeline.allocator().name(),
            "services initialised"
        );
        Ok(Self {
            data_dir: dir,
            pipeline,
            store,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn store(&self) -> &ReferenceStore {
        &self.store
    }

    /// Learn the glyphs of a sample page. `labels` spells the page's glyphs
    /// in reading order; whitespace in it is ignored.
    pub fn train(&mut self, image: &Path, labels: &str) -> Result<usize> {
        let gray = GrayBuffer::open(image)?;
        let labels = labels_from_text(labels);
        let added = self.pipeline.train(&mut self.store, gray, &labels)?;
        self.store.persist()?;
        Ok(added)
    }

    /// Recognize the text of a page.
    pub fn read(&self, image: &Path) -> Result<String> {
        let gray = GrayBuffer::open(image)?;
        Ok(self.pipeline.recognize(&self.store, gray)?.text)
    }

    /// Render the page with its segmentation boxes as a PNG.
    pub fn mask(&self, image: &Path, out: &Path) -> Result<()> {
        let doc = self.segmented(image)?;
        doc.overlay_image()
            .save_with_format(out, ImageFormat::Png)
            .map_err(|err| {
                GlyphscanError::ImageError(format!("failed to write {}: {}", out.display(), err))
            })?;
        info!(out = %out.display(), "boundary overlay written");
        Ok(())
    }

    /// Write the processed page and its boundary mask as value-per-line text
    /// dumps `pixels.txt` and `boundaries.txt` inside `out_dir`.
    pub fn dump(&self, image: &Path, out_dir: &Path) -> Result<()> {
        let doc = self.segmented(image)?;
        std::fs::create_dir_all(out_dir)?;

        let mut pixels = BufWriter::new(File::create(out_dir.join("pixels.txt"))?);
        doc.write_pixel_dump(&mut pixels)?;
        pixels.flush()?;
        let mut boundaries = BufWriter::new(File::create(out_dir.join("boundaries.txt"))?);
        doc.write_boundary_dump(&mut boundaries)?;
        boundaries.flush()?;

        info!(out_dir = %out_dir.display(), "dumps written");
        Ok(())
    }

    /// Binarize, deskew and segment a page without classifying it.
    fn segmented(&self, image: &Path) -> Result<Document> {
        let mut doc = self.pipeline.binarize(GrayBuffer::open(image)?)?;
        self.pipeline.deskew(&mut doc)?;
        Segmenter::new(&self.pipeline.config().segmentation, self.pipeline.allocator()).segment(
            &mut doc,
            &[],
            CharWidthTracker::new(),
        )?;
        Ok(doc)
    }
}

fn load_config(data_dir: &Path) -> Option<OcrConfig> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return None;
    }
    match OcrConfig::load(&path) {
        Ok(config) => Some(config),
        Err(err) => {
            warn!(path = %path.display(), error = %err, "ignoring unreadable config");
            Some(OcrConfig::default())
        }
    }
}

fn persist_config(data_dir: &Path, config: &OcrConfig) -> Result<()> {
    config.save(data_dir.join(CONFIG_FILE))
}
