//! Streaming JSON import.
//!
//! A token stream cannot be rewound, so every object of the document is
//! parked on a provisional graph together with the set of keys it carried.
//! Once the outermost object ends the whole graph is committed through one
//! masked copy-in: fields a document omits are left alone, and no row is
//! touched until every value has been read and checked.

use crate::{
    db::{
        Session,
        copy::{CopyPolicy, FieldMasks},
        import::{
            error::JsonError,
            object::{scalar, target},
        },
        schema::ColumnLayout,
    },
    error::InternalError,
    object::{FieldValue, ObjectGraph, ObjectId, ObjectRef},
    obs::sink::{MetricsEvent, record},
    store::{RowRef, RowStore},
};
use rowmap_schema::{node::FieldDescriptor, types::FieldKind};
use serde::de::{
    self, DeserializeSeed, Deserializer, IgnoredAny, MapAccess, SeqAccess, Visitor,
};
use serde_json::Value as JsonValue;
use std::{collections::BTreeSet, fmt, io, sync::Arc};
use tracing::debug;

impl<S: RowStore> Session<S> {
    /// Import one JSON object read from `reader`. Trailing content other
    /// than whitespace is an error.
    pub fn import_json_stream<R: io::Read>(
        &mut self,
        schema: &str,
        reader: R,
        update: bool,
    ) -> Result<RowRef, InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| {
            let mut de = serde_json::Deserializer::from_reader(reader);
            let parked = s.parse_stream(schema, &mut de)?;
            de.end().map_err(JsonError::syntax)?;

            s.commit_stream(&parked, update)
        })
    }

    /// Import one object from any self-describing `serde` deserializer.
    ///
    /// Keys that name no persisted field are skipped with their values.
    pub fn import_json_deserializer<'de, D: Deserializer<'de>>(
        &mut self,
        schema: &str,
        de: D,
        update: bool,
    ) -> Result<RowRef, InternalError> {
        self.check_mutation()?;

        self.with_metrics(|s| {
            let parked = s.parse_stream(schema, de)?;
            s.commit_stream(&parked, update)
        })
    }

    // Read the whole document into a provisional graph; writes nothing.
    fn parse_stream<'de, D: Deserializer<'de>>(
        &mut self,
        schema: &str,
        de: D,
    ) -> Result<Parked, InternalError> {
        let layout = self.layout(schema)?;
        let mut ctx = StreamCtx {
            session: self,
            graph: ObjectGraph::new(),
            masks: FieldMasks::new(),
            failure: None,
        };
        let result = ObjectSeed {
            ctx: &mut ctx,
            layout,
        }
        .deserialize(de);

        match (result, ctx.failure) {
            (_, Some(err)) => Err(err),
            (Ok(root), None) => Ok(Parked {
                graph: ctx.graph,
                masks: ctx.masks,
                root,
            }),
            (Err(err), None) => Err(JsonError::syntax(err).into()),
        }
    }

    fn commit_stream(&mut self, parked: &Parked, update: bool) -> Result<RowRef, InternalError> {
        let policy = if update {
            CopyPolicy::InsertOrUpdate
        } else {
            CopyPolicy::Insert
        };

        let row = self.copy_masked(&parked.graph, parked.root, policy, &parked.masks)?;
        for (_, object) in parked.graph.iter() {
            record(MetricsEvent::JsonImport {
                schema: object.schema(),
            });
        }
        debug!(row = %row, objects = parked.graph.len(), "streamed document committed");

        Ok(row)
    }
}

///
/// Parked
/// A fully read document that has not touched the store yet.
///

struct Parked {
    graph: ObjectGraph,
    masks: FieldMasks,
    root: ObjectId,
}

///
/// StreamCtx
///
/// State shared by every seed of one streaming import. Engine errors
/// cannot travel through `serde` intact, so they are parked here and the
/// parse is unwound with a plain message.
///

struct StreamCtx<'s, S: RowStore> {
    session: &'s mut Session<S>,
    graph: ObjectGraph,
    masks: FieldMasks,
    failure: Option<InternalError>,
}

impl<S: RowStore> StreamCtx<'_, S> {
    // First failure wins; outer frames only see the unwinding error.
    fn fail<E: de::Error>(&mut self, err: impl Into<InternalError>) -> E {
        let err = err.into();
        let message = err.to_string();
        self.failure.get_or_insert(err);

        E::custom(message)
    }

    fn target_layout(
        &mut self,
        layout: &ColumnLayout,
        field: &FieldDescriptor,
    ) -> Result<Arc<ColumnLayout>, InternalError> {
        self.session.layout(target(layout, field)?)
    }

    fn park(&mut self, id: ObjectId, name: &str, slot: FieldValue) -> Result<(), InternalError> {
        self.graph.object_mut(id)?.put(name, slot);

        Ok(())
    }
}

///
/// ObjectSeed
/// One JSON object of a known schema; yields its provisional object.
///

struct ObjectSeed<'c, 's, S: RowStore> {
    ctx: &'c mut StreamCtx<'s, S>,
    layout: Arc<ColumnLayout>,
}

impl<'de, S: RowStore> DeserializeSeed<'de> for ObjectSeed<'_, '_, S> {
    type Value = ObjectId;

    fn deserialize<D: Deserializer<'de>>(self, de: D) -> Result<ObjectId, D::Error> {
        de.deserialize_map(self)
    }
}

impl<'de, S: RowStore> Visitor<'de> for ObjectSeed<'_, '_, S> {
    type Value = ObjectId;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a JSON object for '{}'", self.layout.name())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ObjectId, A::Error> {
        let Self { ctx, layout } = self;

        let id = ctx.graph.create(&layout.schema);
        let mut present = BTreeSet::new();

        while let Some(key) = map.next_key::<String>()? {
            let Some((field, _)) = layout.field(&key) else {
                map.next_value::<IgnoredAny>()?;
                continue;
            };

            let slot = match field.kind {
                FieldKind::Link => {
                    let target = ctx
                        .target_layout(&layout, field)
                        .map_err(|e| ctx.fail::<A::Error>(e))?;
                    let linked = map.next_value_seed(LinkSeed {
                        ctx: &mut *ctx,
                        layout: target,
                    })?;

                    FieldValue::Link(linked.map(ObjectRef::Unmanaged))
                }
                FieldKind::LinkList => {
                    let target = ctx
                        .target_layout(&layout, field)
                        .map_err(|e| ctx.fail::<A::Error>(e))?;
                    let items = map.next_value_seed(ListSeed {
                        ctx: &mut *ctx,
                        layout: target,
                    })?;

                    FieldValue::LinkList(Some(items.into_iter().map(ObjectRef::Unmanaged).collect()))
                }
                _ => {
                    let json: JsonValue = map.next_value()?;
                    let value = scalar(&layout, field, &json).map_err(|e| ctx.fail::<A::Error>(e))?;

                    if field.primary_key && present.contains(&key) {
                        return Err(ctx.fail(JsonError::RepeatedField {
                            field: format!("{}.{}", layout.name(), field.name),
                        }));
                    }
                    FieldValue::Value(value)
                }
            };

            ctx.park(id, &field.name, slot)
                .map_err(|e| ctx.fail::<A::Error>(e))?;
            present.insert(key);
        }

        if let Some((pk, _)) = layout.primary_key()
            && !present.contains(&pk.name)
        {
            return Err(ctx.fail(InternalError::missing_primary_key(layout.name(), &pk.name)));
        }
        ctx.masks.insert(id, present);

        Ok(id)
    }
}

///
/// LinkSeed
/// A nullable nested object.
///

struct LinkSeed<'c, 's, S: RowStore> {
    ctx: &'c mut StreamCtx<'s, S>,
    layout: Arc<ColumnLayout>,
}

impl<'de, S: RowStore> DeserializeSeed<'de> for LinkSeed<'_, '_, S> {
    type Value = Option<ObjectId>;

    fn deserialize<D: Deserializer<'de>>(self, de: D) -> Result<Option<ObjectId>, D::Error> {
        de.deserialize_option(self)
    }
}

impl<'de, S: RowStore> Visitor<'de> for LinkSeed<'_, '_, S> {
    type Value = Option<ObjectId>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "null or a JSON object for '{}'", self.layout.name())
    }

    fn visit_none<E: de::Error>(self) -> Result<Option<ObjectId>, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Option<ObjectId>, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Option<ObjectId>, D::Error> {
        ObjectSeed {
            ctx: self.ctx,
            layout: self.layout,
        }
        .deserialize(de)
        .map(Some)
    }
}

///
/// ListSeed
/// A nullable array of nested objects; null reads as empty.
///

struct ListSeed<'c, 's, S: RowStore> {
    ctx: &'c mut StreamCtx<'s, S>,
    layout: Arc<ColumnLayout>,
}

impl<'de, S: RowStore> DeserializeSeed<'de> for ListSeed<'_, '_, S> {
    type Value = Vec<ObjectId>;

    fn deserialize<D: Deserializer<'de>>(self, de: D) -> Result<Vec<ObjectId>, D::Error> {
        de.deserialize_option(self)
    }
}

impl<'de, S: RowStore> Visitor<'de> for ListSeed<'_, '_, S> {
    type Value = Vec<ObjectId>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "null or an array of '{}' objects", self.layout.name())
    }

    fn visit_none<E: de::Error>(self) -> Result<Vec<ObjectId>, E> {
        Ok(Vec::new())
    }

    fn visit_unit<E: de::Error>(self) -> Result<Vec<ObjectId>, E> {
        Ok(Vec::new())
    }

    fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Vec<ObjectId>, D::Error> {
        de.deserialize_seq(self)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Vec<ObjectId>, A::Error> {
        let Self { ctx, layout } = self;
        let mut rows = Vec::with_capacity(seq.size_hint().unwrap_or_default());

        while let Some(row) = seq.next_element_seed(ObjectSeed {
            ctx: &mut *ctx,
            layout: layout.clone(),
        })? {
            rows.push(row);
        }

        Ok(rows)
    }
}
