//! Result materialization.
//!
//! The row iterators are lazy, single-pass, and not restartable: the one
//! search is issued on first advancement, and a later `fetch` on the same
//! source issues a new search. Population is schema-driven — each requested
//! property resolves its binding and decodes the row's raw values into the
//! property's declared kind.

use crate::backend::{NativeReader, RawEntry, SearchRequest};
use crate::source::TypedSource;
use crate::tracker::Tracked;
use crate::{EngineError, EngineResult};
use arbor_model::{Channel, DirectoryEntity, TypeMetadata};
use arbor_query::{CompiledQuery, Projected};
use arbor_types::{filetime_to_utc, RawValue, Value, ValueKind};
use std::collections::BTreeMap;
use tracing::debug;

fn mismatch(property: &str, attribute: &str, detail: impl Into<String>) -> EngineError {
    EngineError::TypeMismatch {
        property: property.to_string(),
        attribute: attribute.to_string(),
        detail: detail.into(),
    }
}

/// Decodes a protocol attribute's raw value list into the property's
/// declared kind. `None` means the attribute is absent and the property
/// keeps its default.
fn decode_protocol(
    kind: ValueKind,
    property: &str,
    attribute: &str,
    values: &[RawValue],
) -> EngineResult<Option<Value>> {
    let Some(first) = values.first() else {
        return Ok(None);
    };

    // Byte arrays are never treated as multi-valued: the raw single value
    // is used directly.
    if kind == ValueKind::Bytes {
        return match first {
            RawValue::Bytes(bytes) => Ok(Some(Value::Bytes(bytes.clone()))),
            RawValue::Text(text) => Ok(Some(Value::Bytes(text.clone().into_bytes()))),
            other => Err(mismatch(
                property,
                attribute,
                format!("expected byte data, got {other:?}"),
            )),
        };
    }

    if kind.is_list() {
        return Ok(Some(Value::List(
            values.iter().map(RawValue::to_value).collect(),
        )));
    }

    match kind {
        ValueKind::Guid => match first {
            RawValue::Bytes(bytes) => Value::guid_from_bytes(bytes)
                .map(|guid| Some(Value::Guid(guid)))
                .map_err(|err| mismatch(property, attribute, err.to_string())),
            other => Err(mismatch(
                property,
                attribute,
                format!("GUID attributes arrive as byte data, got {other:?}"),
            )),
        },
        ValueKind::Timestamp => match first {
            RawValue::LargeInt { high, low } => filetime_to_utc(*high, *low)
                .map(|ts| Some(Value::Timestamp(ts)))
                .map_err(|err| mismatch(property, attribute, err.to_string())),
            other => Err(mismatch(
                property,
                attribute,
                format!("timestamp attributes arrive as a split tick pair, got {other:?}"),
            )),
        },
        _ => Ok(Some(first.to_value())),
    }
}

/// Populates one entity instance from a raw row.
///
/// Protocol-channel coercion failures abort the row; native-reader getter
/// failures leave the property at its default (documented tolerance).
pub(crate) fn populate<T: DirectoryEntity>(
    metadata: &TypeMetadata,
    reader: Option<&dyn NativeReader>,
    compiled: &CompiledQuery,
    entry: &RawEntry,
) -> EngineResult<T> {
    let mut entity = T::default();

    for property in compiled.properties() {
        let Some(spec) = metadata.property(property) else {
            continue;
        };
        let Some(binding) = metadata.binding_for(property) else {
            continue;
        };

        match binding.channel {
            Channel::Protocol => {
                let values = entry
                    .attributes
                    .get(&binding.attribute)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                if let Some(value) =
                    decode_protocol(spec.kind, property, &binding.attribute, values)?
                {
                    entity.set_property(property, value)?;
                }
            }
            Channel::NativeReader => match (reader, entry.native.as_ref()) {
                (Some(reader), Some(handle)) => {
                    match reader.get_named(handle, &binding.attribute) {
                        Ok(value) if !value.is_null() => {
                            entity.set_property(property, value)?;
                        }
                        Ok(_) => {}
                        Err(err) => {
                            debug!(property, %err, "native getter failed, leaving default");
                        }
                    }
                }
                _ => debug!(property, "no native reader or handle, leaving default"),
            },
        }
    }

    Ok(entity)
}

enum CursorState {
    Pending,
    Active(std::vec::IntoIter<RawEntry>),
    Done,
}

/// Shared lazy cursor: issues the search on first advancement, then walks
/// the in-memory rows, materializing one entity per row.
struct RowCursor<'a, T: DirectoryEntity> {
    source: &'a TypedSource<T>,
    compiled: CompiledQuery,
    metadata: TypeMetadata,
    state: CursorState,
}

impl<'a, T: DirectoryEntity> RowCursor<'a, T> {
    fn new(source: &'a TypedSource<T>, compiled: CompiledQuery, metadata: TypeMetadata) -> Self {
        Self {
            source,
            compiled,
            metadata,
            state: CursorState::Pending,
        }
    }

    fn next_row(&mut self) -> Option<EngineResult<(RawEntry, T)>> {
        loop {
            match &mut self.state {
                CursorState::Pending => {
                    let request = SearchRequest {
                        base: self.source.base.clone(),
                        scope: self.source.scope,
                        filter: self.compiled.final_filter(),
                        attributes: self.compiled.attributes().to_vec(),
                        options: self.source.options.clone(),
                    };
                    match self.source.backend.search(&request) {
                        Ok(rows) => {
                            debug!(
                                filter = %request.filter,
                                rows = rows.len(),
                                "search executed"
                            );
                            self.state = CursorState::Active(rows.into_iter());
                        }
                        Err(err) => {
                            self.state = CursorState::Done;
                            return Some(Err(err.into()));
                        }
                    }
                }
                CursorState::Active(rows) => {
                    let entry = rows.next()?;
                    let result = populate::<T>(
                        &self.metadata,
                        self.source.reader.as_deref(),
                        &self.compiled,
                        &entry,
                    );
                    return Some(result.map(|entity| (entry, entity)));
                }
                CursorState::Done => return None,
            }
        }
    }
}

/// Lazy sequence of tracked entities, one per search result row.
pub struct EntityRows<'a, T: DirectoryEntity> {
    cursor: RowCursor<'a, T>,
}

impl<T: DirectoryEntity> std::fmt::Debug for EntityRows<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityRows").finish_non_exhaustive()
    }
}

impl<'a, T: DirectoryEntity> EntityRows<'a, T> {
    pub(crate) fn new(
        source: &'a TypedSource<T>,
        compiled: CompiledQuery,
        metadata: TypeMetadata,
    ) -> Self {
        Self {
            cursor: RowCursor::new(source, compiled, metadata),
        }
    }
}

impl<T: DirectoryEntity> Iterator for EntityRows<'_, T> {
    type Item = EngineResult<Tracked<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.cursor.next_row()?;
        Some(row.map(|(entry, entity)| {
            Tracked::new(
                entity,
                entry.dn,
                entry.native,
                self.cursor.source.ledger.clone(),
            )
        }))
    }
}

/// Lazy sequence of projected records.
pub struct ProjectedRows<'a, T: DirectoryEntity> {
    cursor: RowCursor<'a, T>,
}

impl<'a, T: DirectoryEntity> ProjectedRows<'a, T> {
    pub(crate) fn new(
        source: &'a TypedSource<T>,
        compiled: CompiledQuery,
        metadata: TypeMetadata,
    ) -> Self {
        Self {
            cursor: RowCursor::new(source, compiled, metadata),
        }
    }
}

impl<T: DirectoryEntity> Iterator for ProjectedRows<'_, T> {
    type Item = EngineResult<Projected>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.cursor.next_row()?;
        Some(row.and_then(|(_, entity)| match self.cursor.compiled.plan() {
            Some(plan) => plan.apply(&entity).map_err(EngineError::from),
            // An identity selection projects every populated property.
            None => {
                let mut fields = BTreeMap::new();
                for property in self.cursor.compiled.properties() {
                    fields.insert(
                        property.clone(),
                        Projected::Value(entity.property(property).unwrap_or(Value::Null)),
                    );
                }
                Ok(Projected::Record(fields))
            }
        }))
    }
}
