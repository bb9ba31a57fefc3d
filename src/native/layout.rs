//! C record layout (field offsets, size, alignment)

/// Placement of one field inside a record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLayout {
    /// The name of the field
    pub name: String,
    /// The byte offset of this field from the start of the record
    pub offset: usize,
    /// Field size in bytes
    pub size: usize,
}

/// Layout of a complete record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordLayout {
    /// Fields in declaration order
    pub fields: Vec<FieldLayout>,
    /// Total size in bytes, including tail padding
    pub size: usize,
    /// Record alignment in bytes
    pub align: usize,
}

impl RecordLayout {
    /// Lay out `(name, size, align)` triples with C rules
    ///
    /// `max_align` clamps every field alignment (the `pack` attribute); pass
    /// `None` for natural alignment.
    pub fn compute<'a, I>(fields: I, max_align: Option<usize>) -> RecordLayout
    where
        I: IntoIterator<Item = (&'a str, usize, usize)>,
    {
        let clamp = |align: usize| match max_align {
            Some(max) => align.min(max.max(1)),
            None => align,
        };

        let mut offset = 0;
        let mut record_align = 1;
        let mut placed = Vec::new();
        for (name, size, align) in fields {
            let align = clamp(align.max(1));
            offset = align_up(offset, align);
            placed.push(FieldLayout {
                name: name.to_string(),
                offset,
                size,
            });
            offset += size;
            record_align = record_align.max(align);
        }

        RecordLayout {
            fields: placed,
            size: align_up(offset, record_align),
            align: record_align,
        }
    }

    /// Offset of the named field
    pub fn offset_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().find(|f| f.name == name).map(|f| f.offset)
    }
}

fn align_up(offset: usize, align: usize) -> usize {
    offset.div_ceil(align) * align
}
