//! Custom `userProperties:` attributes as dynamic host plugs.

use crate::bridge::{plug_type_for, set_animated, value_to_plug, AnimOptions};
use crate::context::ReadContext;
use crate::error::{ImportError, Result};
use stagelink_host::{NodeHandle, PlugValue};
use stagelink_stage::{Attribute, Prim, TimeSample};

/// Namespace of attributes imported as user plugs.
pub const USER_PROPERTIES_PREFIX: &str = "userProperties:";

/// Host plug name for a user attribute, `None` if `name` is not one.
pub fn user_plug_name(name: &str) -> Option<String> {
    let rest = name.strip_prefix(USER_PROPERTIES_PREFIX)?;
    if rest.is_empty() {
        return None;
    }
    Some(rest.replace(':', "_"))
}

/// Copy every user attribute of `prim` onto `node`.
pub fn read_user_attributes(prim: &Prim, node: NodeHandle, ctx: &mut ReadContext<'_>) -> Result<()> {
    if !ctx.args().import_user_attributes {
        return Ok(());
    }
    for attr in prim.attributes() {
        let Some(plug) = user_plug_name(attr.name()) else {
            continue;
        };
        if let Err(err) = read_user_attribute(attr, node, &plug, ctx) {
            log::error!("{}: cannot import {}: {}", prim.path(), attr.name(), err);
        }
    }
    Ok(())
}

fn read_user_attribute(attr: &Attribute, node: NodeHandle, plug: &str, ctx: &mut ReadContext<'_>) -> Result<()> {
    let plug_type = plug_type_for(attr.value_type());
    let default = match attr.value_at(TimeSample::Default) {
        Some(value) => Some(
            value_to_plug(value, plug_type).ok_or_else(|| ImportError::UnsupportedValue(attr.name().to_string()))?,
        ),
        None => None,
    };
    ctx.modifier().ensure_plug(node, plug, plug_type)?;
    if let Some(value) = default {
        ctx.modifier().set_plug(node, plug, value)?;
    }

    let args = ctx.args();
    if !args.read_animation || plug_type.anim_curve_type().is_none() {
        return Ok(());
    }
    let times = attr.sample_times_in(&args.sample_interval());
    if times.len() <= 1 {
        return Ok(());
    }
    let samples: Vec<(f64, PlugValue)> = times
        .into_iter()
        .filter_map(|t| {
            let value = attr.value_at(TimeSample::At(t))?;
            value_to_plug(value, plug_type).map(|v| (t, v))
        })
        .collect();
    let options = AnimOptions::from_args(args);
    let (modifier, registry) = ctx.split();
    set_animated(modifier, registry, node, plug, &samples, &options)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_plug_name() {
        assert_eq!(user_plug_name("userProperties:rigid").as_deref(), Some("rigid"));
        assert_eq!(user_plug_name("userProperties:a:b").as_deref(), Some("a_b"));
        assert_eq!(user_plug_name("userProperties:"), None);
        assert_eq!(user_plug_name("primvars:st"), None);
    }
}
