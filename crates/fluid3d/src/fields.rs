//! The solver's set of double-buffered fields and the pass discipline over them.
//!
//! A pass renders into exactly one output field. [`Fields::render`] checks the
//! output's `write` buffer out of its slab, hands the pass a read-only
//! [`FieldView`] of everything else, then swaps the output. Reading and
//! writing the same storage in one pass is impossible by construction.

use glam::Vec4;

use crate::error::FluidError;
use crate::layout::TiledLayout;
use crate::sampler::TiledSampler;
use crate::slab::Slab;
use crate::texture::{Texture, TextureFormat};

/// Fields owned by the solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldId {
    Density,
    Velocity,
    Pressure,
    Divergence,
    /// Vorticity vector in xyz, its magnitude in w.
    Curl,
    /// Intermediate storage for MacCormack traces and the diffusion right-hand side.
    Scratch,
}

impl FieldId {
    pub const ALL: [FieldId; 6] = [
        FieldId::Density,
        FieldId::Velocity,
        FieldId::Pressure,
        FieldId::Divergence,
        FieldId::Curl,
        FieldId::Scratch,
    ];

    pub fn format(self) -> TextureFormat {
        match self {
            FieldId::Density | FieldId::Pressure | FieldId::Divergence => TextureFormat::Red,
            FieldId::Velocity | FieldId::Curl | FieldId::Scratch => TextureFormat::Rgba,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            FieldId::Density => "Density",
            FieldId::Velocity => "Velocity",
            FieldId::Pressure => "Pressure",
            FieldId::Divergence => "Divergence",
            FieldId::Curl => "Vorticity",
            FieldId::Scratch => "Scratch",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Which buffer of a slab a pass reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BufferSide {
    Read,
    Write,
}

/// A specific buffer of a specific field.
///
/// Almost every input is `field.read`; the MacCormack correction also needs
/// the forward trace left in the scratch field's `write` buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureRef {
    pub field: FieldId,
    pub buffer: BufferSide,
}

impl TextureRef {
    pub fn read(field: FieldId) -> Self {
        Self {
            field,
            buffer: BufferSide::Read,
        }
    }

    pub fn write(field: FieldId) -> Self {
        Self {
            field,
            buffer: BufferSide::Write,
        }
    }
}

impl From<FieldId> for TextureRef {
    fn from(field: FieldId) -> Self {
        TextureRef::read(field)
    }
}

/// All solver fields, allocated for one layout.
#[derive(Clone, Debug)]
pub struct Fields {
    layout: TiledLayout,
    slabs: Vec<Slab>,
}

impl Fields {
    /// Allocate every field, zero-filled.
    pub fn new(layout: &TiledLayout) -> Result<Self, FluidError> {
        let slabs = FieldId::ALL
            .iter()
            .map(|id| Slab::new(layout, id.format()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            layout: *layout,
            slabs,
        })
    }

    pub fn layout(&self) -> &TiledLayout {
        &self.layout
    }

    pub fn slab(&self, id: FieldId) -> &Slab {
        &self.slabs[id.index()]
    }

    pub fn slab_mut(&mut self, id: FieldId) -> &mut Slab {
        &mut self.slabs[id.index()]
    }

    /// Current contents of a field.
    pub fn read(&self, id: FieldId) -> &Texture {
        &self.slabs[id.index()].read
    }

    /// Run one pass into `output`.
    ///
    /// The output's `write` buffer starts as a copy of its `read` buffer, so
    /// texels the pass does not touch carry over. After `pass` returns the
    /// slab is swapped.
    pub fn render<F>(&mut self, output: FieldId, pass: F)
    where
        F: FnOnce(&FieldView<'_>, &mut Texture),
    {
        let mut target = self.slabs[output.index()].take_write();
        target.copy_from(&self.slabs[output.index()].read);

        pass(
            &FieldView {
                fields: self,
                output,
            },
            &mut target,
        );

        self.slabs[output.index()].commit(target);
    }

    /// Copy the current contents of `src` into `dst` (read buffer), converting
    /// between channel counts where needed.
    pub fn copy(&mut self, src: FieldId, dst: FieldId) {
        if src == dst {
            return;
        }
        self.render(dst, |view, target| {
            let source = view.read(src);
            if source.format() == target.format() {
                target.copy_from(source);
            } else {
                for index in 0..view.layout().texel_count() {
                    target.set_texel(index, source.texel(index));
                }
            }
        });
    }

    /// Sum of a field's channels over the whole texture.
    pub fn total(&self, id: FieldId) -> Vec4 {
        self.read(id).channel_sums()
    }
}

/// Read-only access to every field buffer except the one being written.
pub struct FieldView<'a> {
    fields: &'a Fields,
    output: FieldId,
}

impl<'a> FieldView<'a> {
    pub fn layout(&self) -> &'a TiledLayout {
        &self.fields.layout
    }

    /// Field currently being rendered.
    pub fn output(&self) -> FieldId {
        self.output
    }

    /// The `read` buffer of a field. The output's `read` buffer stays readable
    /// while its `write` buffer is rendered.
    pub fn read(&self, id: FieldId) -> &'a Texture {
        &self.fields.slabs[id.index()].read
    }

    /// Resolve a buffer reference.
    ///
    /// # Panics
    /// If it names the `write` buffer of the field being rendered.
    pub fn texture(&self, source: TextureRef) -> &'a Texture {
        let slab = &self.fields.slabs[source.field.index()];
        match source.buffer {
            BufferSide::Read => &slab.read,
            BufferSide::Write => {
                assert!(
                    source.field != self.output,
                    "{} write buffer is the pass target",
                    source.field.name()
                );
                &slab.write
            }
        }
    }

    pub fn sampler(&self, source: impl Into<TextureRef>) -> TiledSampler<'a> {
        TiledSampler::new(self.layout(), self.texture(source.into()))
    }
}
