#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod assembly;
pub mod catalog;
pub mod chute;
pub mod engine;
pub mod geom;
pub mod parse;

use std::fmt;

use assembly::PartId;
use engine::{ApplyReport, PresetApplier, PropagationEngine, Scope, ValidationAggregator, ValidationError};
use parse::config_xml::{self, ConfigSet};
use parse::craft_xml::{self, Craft};
use parse::persist_xml;
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

const NO_CRAFT: &str = "er is geen voertuig geladen";

#[derive(Debug, Serialize)]
struct FieldErrorExport {
    field: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    chute: Option<usize>,
    message: String,
}

impl From<&ValidationError> for FieldErrorExport {
    fn from(error: &ValidationError) -> Self {
        let chute = match error.field {
            engine::Field::ChuteSpecific { chute, .. } => Some(chute),
            _ => None,
        };
        Self {
            field: error.field.label(),
            chute,
            message: error.message.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
struct PartExport {
    id: String,
    name: String,
    position: [f64; 3],
    scale: [f64; 3],
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<usize>,
}

#[derive(Debug, Default, Serialize)]
struct UpdateExport {
    resized: Vec<String>,
    errors: Vec<String>,
    case_changes: Vec<String>,
}

#[derive(Debug, Default, Serialize)]
struct ApplyExport {
    resized: bool,
    counterparts: Vec<String>,
    stale_counterparts: usize,
    committed: bool,
    commit_errors: Vec<FieldErrorExport>,
}

impl ApplyExport {
    fn new(craft: &Craft, report: &ApplyReport) -> Self {
        Self {
            resized: report
                .resize
                .as_ref()
                .is_some_and(|outcome| outcome.report().is_some()),
            counterparts: report
                .counterparts
                .iter()
                .filter(|(_, result)| result.is_ok())
                .filter_map(|(id, _)| craft.label(*id).map(str::to_owned))
                .collect(),
            stale_counterparts: report.stale_counterparts.len(),
            committed: report.committed(),
            commit_errors: report.commit_errors.iter().map(FieldErrorExport::from).collect(),
        }
    }
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    config: ConfigSet,
    craft: Option<Craft>,
    modified: Vec<PartId>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new() -> Engine {
        Engine {
            config: ConfigSet::default(),
            craft: None,
            modified: Vec::new(),
        }
    }

    /// Voeg een configuratiedocument (maten, lichamen, bibliotheken, presets) toe.
    #[wasm_bindgen]
    pub fn load_config(&mut self, xml: &str) -> Result<(), JsValue> {
        config_xml::load_into(xml, &mut self.config).map_err(to_js_error)?;
        debug_log!(
            "configuratie geladen: {} archetypes, {} presets",
            self.config.sizes.archetypes().count(),
            self.config.presets.len()
        );
        Ok(())
    }

    /// Laad een voertuig en initialiseer al zijn procedurele onderdelen.
    #[wasm_bindgen]
    pub fn load_craft(&mut self, xml: &str) -> Result<(), JsValue> {
        self.try_load_craft(xml).map_err(to_js_error)
    }

    /// Kies een nieuwe maat; de herschaling volgt bij de volgende `update`.
    #[wasm_bindgen]
    pub fn set_size(&mut self, part: &str, index: usize) -> Result<(), JsValue> {
        self.try_set_size(part, index).map_err(to_js_error)
    }

    /// Voer openstaande maatwijzigingen door.
    #[wasm_bindgen]
    pub fn update(&mut self) -> Result<JsValue, JsValue> {
        let export = self.try_update().map_err(to_js_error)?;
        to_js(&export)
    }

    /// Invoerfouten van een onderdeel voor `general`, `primary` of `secondary`.
    #[wasm_bindgen]
    pub fn get_errors(&self, part: &str, scope: &str) -> Result<JsValue, JsValue> {
        let errors = self.try_errors(part, scope).map_err(to_js_error)?;
        to_js(&errors)
    }

    /// Commit de bewerkte velden, eventueel ook naar alle symmetrische tegenhangers.
    #[wasm_bindgen]
    pub fn apply(&mut self, part: &str, symmetry: bool) -> Result<JsValue, JsValue> {
        let export = self.try_apply(part, symmetry).map_err(to_js_error)?;
        to_js(&export)
    }

    /// Pas een preset toe op een onderdeel.
    #[wasm_bindgen]
    pub fn apply_preset(&mut self, part: &str, name: &str) -> Result<JsValue, JsValue> {
        let export = self.try_apply_preset(part, name).map_err(to_js_error)?;
        to_js(&export)
    }

    /// Namen van de presets die op dit onderdeel passen.
    #[wasm_bindgen]
    pub fn get_presets(&self, part: &str) -> Result<JsValue, JsValue> {
        let names = self.try_presets(part).map_err(to_js_error)?;
        to_js(&names)
    }

    /// Bewaarde status van een onderdeel als XML.
    #[wasm_bindgen]
    pub fn save_part(&self, part: &str) -> Result<String, JsValue> {
        self.try_save_part(part).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn module_cost(&self, part: &str) -> Result<f64, JsValue> {
        self.try_module_cost(part).map_err(to_js_error)
    }

    /// Positie en schaal van alle onderdelen.
    #[wasm_bindgen]
    pub fn get_positions(&self) -> Result<JsValue, JsValue> {
        let parts = self.try_positions().map_err(to_js_error)?;
        to_js(&parts)
    }

    /// Onderdelen waarvoor de host sinds de vorige aanroep een wijziging kreeg.
    #[wasm_bindgen]
    pub fn take_modified(&mut self) -> Result<JsValue, JsValue> {
        let labels = self.try_take_modified();
        to_js(&labels)
    }
}

impl Engine {
    fn craft(&self) -> Result<&Craft, String> {
        self.craft.as_ref().ok_or_else(|| NO_CRAFT.to_owned())
    }

    fn lookup(&self, label: &str) -> Result<PartId, String> {
        self.craft()?
            .id(label.trim())
            .ok_or_else(|| format!("onbekend onderdeel `{label}`"))
    }

    fn try_load_craft(&mut self, xml: &str) -> Result<(), String> {
        let mut craft = craft_xml::parse_str(xml).map_err(|err| err.to_string())?;
        let fresh = engine::initialize_all(
            &mut craft.assembly,
            &self.config.bodies,
            &self.config.cases,
        );
        debug_log!(
            "voertuig `{}` geladen: {} onderdelen, {} nieuw geïnitialiseerd",
            craft.name,
            craft.assembly.part_count(),
            fresh.len()
        );
        self.craft = Some(craft);
        self.modified.clear();
        Ok(())
    }

    fn try_set_size(&mut self, label: &str, index: usize) -> Result<(), String> {
        let id = self.lookup(label)?;
        let Self { config, craft, .. } = self;
        let craft = craft.as_mut().ok_or_else(|| NO_CRAFT.to_owned())?;
        let part = craft
            .assembly
            .part_mut(id)
            .ok_or_else(|| format!("onderdeel `{label}` bestaat niet meer"))?;
        let count = config.sizes.sizes(&part.name).len();
        if index >= count {
            return Err(format!(
                "maat {index} bestaat niet voor `{}` ({count} maten)",
                part.name
            ));
        }
        let chute = part
            .procedural
            .as_mut()
            .ok_or_else(|| format!("onderdeel `{label}` is niet procedureel"))?;
        chute.size = index;
        Ok(())
    }

    fn try_update(&mut self) -> Result<UpdateExport, String> {
        let Self { config, craft, .. } = self;
        let craft = craft.as_mut().ok_or_else(|| NO_CRAFT.to_owned())?;
        let report = engine::update(&mut craft.assembly, &config.sizes);

        let label = |id: PartId| craft.label(id).unwrap_or_default().to_owned();
        Ok(UpdateExport {
            resized: report
                .resized
                .iter()
                .filter(|(_, outcome)| outcome.report().is_some())
                .map(|(id, _)| label(*id))
                .collect(),
            errors: report
                .errors
                .iter()
                .map(|(id, err)| format!("{}: {err}", label(*id)))
                .collect(),
            case_changes: report.case_changes.iter().map(|id| label(*id)).collect(),
        })
    }

    fn try_errors(&self, label: &str, scope: &str) -> Result<Vec<FieldErrorExport>, String> {
        let scope: Scope = scope.parse()?;
        let id = self.lookup(label)?;
        let chute = self
            .craft()?
            .assembly
            .part(id)
            .and_then(|part| part.procedural.as_ref())
            .ok_or_else(|| format!("onderdeel `{label}` is niet procedureel"))?;
        let errors = ValidationAggregator::new(&self.config.bodies).errors(chute, scope);
        Ok(errors.iter().map(FieldErrorExport::from).collect())
    }

    fn try_apply(&mut self, label: &str, symmetry: bool) -> Result<ApplyExport, String> {
        let id = self.lookup(label)?;
        let Self {
            config,
            craft,
            modified,
        } = self;
        let craft = craft.as_mut().ok_or_else(|| NO_CRAFT.to_owned())?;

        let resizer = PropagationEngine::new(&config.sizes);
        let applier = PresetApplier::new(&resizer, &config.sizes, &config.bodies, &config.cases);
        let report = applier
            .apply_changes(&mut craft.assembly, id, symmetry, &mut |part: PartId| {
                modified.push(part);
            })
            .map_err(|err| err.to_string())?;
        Ok(ApplyExport::new(craft, &report))
    }

    fn try_apply_preset(&mut self, label: &str, name: &str) -> Result<ApplyExport, String> {
        let id = self.lookup(label)?;
        let Self {
            config,
            craft,
            modified,
        } = self;
        let craft = craft.as_mut().ok_or_else(|| NO_CRAFT.to_owned())?;

        let part = craft
            .assembly
            .part(id)
            .ok_or_else(|| format!("onderdeel `{label}` bestaat niet meer"))?;
        let chute_count = part.procedural.as_ref().map_or(0, |chute| chute.chutes.len());
        let sizes = config.sizes.sizes(&part.name);
        let (index, preset) = config
            .presets
            .relevant(sizes, chute_count)
            .into_iter()
            .enumerate()
            .find(|(_, preset)| preset.name == name)
            .ok_or_else(|| format!("preset `{name}` past niet op `{label}`"))?;

        let resizer = PropagationEngine::new(&config.sizes);
        let applier = PresetApplier::new(&resizer, &config.sizes, &config.bodies, &config.cases);
        let report = applier
            .apply(&mut craft.assembly, id, preset, &mut |part: PartId| {
                modified.push(part);
            })
            .map_err(|err| err.to_string())?;

        if let Some(chute) = craft
            .assembly
            .part_mut(id)
            .and_then(|part| part.procedural.as_mut())
        {
            chute.preset_id = index;
        }
        Ok(ApplyExport::new(craft, &report))
    }

    fn try_presets(&self, label: &str) -> Result<Vec<String>, String> {
        let id = self.lookup(label)?;
        let part = self
            .craft()?
            .assembly
            .part(id)
            .ok_or_else(|| format!("onderdeel `{label}` bestaat niet meer"))?;
        let chute_count = part.procedural.as_ref().map_or(0, |chute| chute.chutes.len());
        Ok(self
            .config
            .presets
            .relevant(self.config.sizes.sizes(&part.name), chute_count)
            .into_iter()
            .map(|preset| preset.name.clone())
            .collect())
    }

    fn try_save_part(&self, label: &str) -> Result<String, String> {
        let id = self.lookup(label)?;
        let chute = self
            .craft()?
            .assembly
            .part(id)
            .and_then(|part| part.procedural.as_ref())
            .ok_or_else(|| format!("onderdeel `{label}` is niet procedureel"))?;
        persist_xml::to_xml(chute).map_err(|err| err.to_string())
    }

    fn try_module_cost(&self, label: &str) -> Result<f64, String> {
        let id = self.lookup(label)?;
        let part = self
            .craft()?
            .assembly
            .part(id)
            .ok_or_else(|| format!("onderdeel `{label}` bestaat niet meer"))?;
        Ok(part.procedural.as_ref().map_or(0.0, |chute| {
            chute.module_cost(self.config.sizes.sizes(&part.name))
        }))
    }

    fn try_positions(&self) -> Result<Vec<PartExport>, String> {
        let craft = self.craft()?;
        Ok(craft
            .labels()
            .filter_map(|(label, id)| {
                craft.assembly.part(id).map(|part| PartExport {
                    id: label.to_owned(),
                    name: part.name.clone(),
                    position: part.position.to_array(),
                    scale: part.model_scale.to_array(),
                    size: part.procedural.as_ref().map(|chute| chute.size),
                })
            })
            .collect())
    }

    fn try_take_modified(&mut self) -> Vec<String> {
        let modified = std::mem::take(&mut self.modified);
        let Some(craft) = self.craft.as_ref() else {
            return Vec::new();
        };
        modified
            .into_iter()
            .filter_map(|id| craft.label(id).map(str::to_owned))
            .collect()
    }
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsError::new(&err.to_string()).into())
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
