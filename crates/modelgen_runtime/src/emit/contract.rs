//! Solidity emitter.
//!
//! Renders the fungible token inventory, one data contract per catalog data
//! type, one ladder contract per experience ladder, one ERC-721 contract per
//! model, one visitor per polymorphic group, and the `GameData` and
//! `GameLogicBase` aggregates.
//!
//! Every name, dependency and reference comes from the [`ResolvedModel`];
//! instance references are rendered as the resolved ordinal of their target.

use std::collections::BTreeSet;

use heck::ToSnakeCase;
use modelgen_engine::classify::{DATA_FIELD, LADDER_FIELD};
use modelgen_engine::ladder::{EXPERIENCE_FIELD, LEVELS_FIELD};
use modelgen_engine::{Category, ResolvedModel};
use modelgen_foundation::{EntityTypeId, Error, FieldType, InstanceKey, Record, Result, Scalar, Value};
use modelgen_schema::{EntityKind, Instance};

use super::{Emitter, OutputTree, SourceBuilder};

const LICENSE: &str = "// SPDX-License-Identifier: UNLICENSED";
const PRAGMA: &str = "pragma solidity ^0.8.0;";

/// Model field accumulating experience.
const EXP_FIELD: &str = "exp";

/// Upgrade material field holding the experience one unit grants.
const VALUE_FIELD: &str = "value";

/// Emits the Solidity contract tree.
#[derive(Clone, Copy, Debug, Default)]
pub struct ContractEmitter;

impl ContractEmitter {
    /// Creates the emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Emitter for ContractEmitter {
    fn name(&self) -> &'static str {
        "solidity"
    }

    fn emit(&self, model: &ResolvedModel) -> Result<OutputTree> {
        let mut tree = OutputTree::new();
        tree.insert("Inventory.sol", inventory(model)?)?;

        let mut data_contracts = Vec::new();
        let mut models = Vec::new();
        for (ty, category) in model.classification().iter() {
            match category {
                Category::StaticData => {
                    let path = format!("data/{}.sol", data_contract(model, ty)?);
                    tree.insert(path, data_source(model, ty)?)?;
                    data_contracts.push(ty);
                }
                Category::LadderData => {
                    let path = format!("data/{}.sol", data_contract(model, ty)?);
                    tree.insert(path, ladder_source(model, ty)?)?;
                    data_contracts.push(ty);
                }
                Category::Model => {
                    let path = format!("model/{}.sol", model.canonical_name(ty)?);
                    tree.insert(path, model_source(model, ty)?)?;
                    models.push(ty);
                }
                Category::PolymorphicVariant | Category::PlainStruct => {}
            }
        }

        for group in model.polymorphic_groups().iter() {
            if group.variants.is_empty() {
                continue;
            }
            let path = format!("visitors/{}Visitor.sol", model.canonical_name(group.base)?);
            tree.insert(path, visitor_source(model, group.base, &group.variants)?)?;
        }

        tree.insert("GameData.sol", game_data(model, &data_contracts)?)?;
        tree.insert("GameLogicBase.sol", game_logic(model, &models)?)?;
        Ok(tree)
    }
}

// =============================================================================
// Types and Values
// =============================================================================

/// Renders Solidity types and literals, collecting the array initializer
/// functions that list literals need.
struct Sol<'m> {
    model: &'m ResolvedModel,
    arrays: Vec<String>,
    next_array: u32,
}

impl<'m> Sol<'m> {
    fn new(model: &'m ResolvedModel) -> Self {
        Self {
            model,
            arrays: Vec::new(),
            next_array: 0,
        }
    }

    fn ident(&self, ty: EntityTypeId) -> Result<&'m str> {
        self.model.identifier_name(ty)
    }

    fn struct_name(&self, ty: EntityTypeId) -> Result<String> {
        Ok(format!("{}_t", self.ident(ty)?))
    }

    /// Models are stored in their own contract and embedded by id.
    fn stored_by_id(&self, ty: EntityTypeId) -> Result<bool> {
        Ok(self.model.entity(ty)?.kind() == EntityKind::Model)
    }

    fn sol_type(&self, ty: &FieldType) -> Result<String> {
        Ok(match ty {
            FieldType::Scalar(Scalar::Int) | FieldType::Reference(_) => "uint".to_string(),
            FieldType::Scalar(Scalar::String) => "string".to_string(),
            FieldType::Optional(inner) => self.sol_type(inner)?,
            FieldType::List(element) => format!("{}[]", self.sol_type(element)?),
            FieldType::Map(key, value) => {
                format!("mapping({} => {})", self.sol_type(key)?, self.sol_type(value)?)
            }
            FieldType::Embedded(target) if self.stored_by_id(*target)? => "uint".to_string(),
            FieldType::Embedded(target) => self.struct_name(*target)?,
        })
    }

    /// Type of a return value or parameter, with its data location.
    fn param_type(&self, ty: &FieldType) -> Result<String> {
        let base = self.sol_type(ty)?;
        let by_reference = match ty {
            FieldType::Optional(inner) => !matches!(
                **inner,
                FieldType::Scalar(Scalar::Int) | FieldType::Reference(_)
            ),
            FieldType::Scalar(Scalar::Int) | FieldType::Reference(_) => false,
            FieldType::Embedded(target) => !self.stored_by_id(*target)?,
            _ => true,
        };
        Ok(if by_reference { format!("{base} memory") } else { base })
    }

    fn struct_def(&self, src: &mut SourceBuilder, ty: EntityTypeId) -> Result<()> {
        let entity = self.model.entity(ty)?;
        src.open(format!("struct {} {{", self.struct_name(ty)?));
        for field in entity.fields() {
            src.line(format!("{} {};", self.sol_type(&field.ty)?, member(&field.name)));
        }
        if entity.is_fungible() {
            src.line("uint _token_id;");
        }
        src.close("}");
        Ok(())
    }

    /// Struct definitions for `ty` and everything it lays out, dependencies
    /// first.
    fn struct_defs(&self, src: &mut SourceBuilder, ty: EntityTypeId) -> Result<()> {
        let deps = self.model.dependencies_of(ty)?;
        for &dep in deps.layout_order.iter().chain(std::iter::once(&ty)) {
            if self.model.entity(dep)?.is_abstract() {
                continue;
            }
            self.struct_def(src, dep)?;
            src.blank();
        }
        Ok(())
    }

    fn value(&mut self, ty: &FieldType, value: &Value) -> Result<String> {
        match (ty, value) {
            (_, Value::Nil) => self.zero(ty),
            (FieldType::Optional(inner), _) => self.value(inner, value),
            (FieldType::Scalar(Scalar::Int), Value::Int(n)) => Ok(n.to_string()),
            (FieldType::Scalar(Scalar::String), Value::String(s)) => Ok(quote(s)),
            (FieldType::Reference(_), Value::Ref(raw)) => {
                let key = self.model.resolve(raw)?;
                Ok(format!("uint({})", key.ordinal))
            }
            (FieldType::List(element), Value::List(items)) => {
                let items: Vec<Value> = items.iter().cloned().collect();
                self.array(element, &items)
            }
            (FieldType::Embedded(_), Value::Record(record)) => self.record(record),
            (FieldType::Map(..), _) => Err(Error::invalid_schema(
                "mapping fields cannot be initialized from data",
            )),
            _ => Err(Error::value_mismatch(
                self.model.schema().describe(ty),
                value.kind_name(),
            )),
        }
    }

    fn zero(&mut self, ty: &FieldType) -> Result<String> {
        match ty {
            FieldType::Scalar(Scalar::Int) | FieldType::Reference(_) => Ok("0".to_string()),
            FieldType::Scalar(Scalar::String) => Ok("\"\"".to_string()),
            FieldType::Optional(inner) => self.zero(inner),
            FieldType::List(element) => Ok(format!("new {}[](0)", self.sol_type(element)?)),
            FieldType::Embedded(target) if self.stored_by_id(*target)? => Ok("0".to_string()),
            FieldType::Embedded(target) => self.record(&Record::new(*target)),
            FieldType::Map(..) => Err(Error::invalid_schema(
                "mapping fields cannot be initialized from data",
            )),
        }
    }

    fn record(&mut self, record: &Record) -> Result<String> {
        let entity = self.model.entity(record.ty())?;
        let mut members = Vec::with_capacity(entity.fields().len() + 1);
        for field in entity.fields() {
            let value = record.get(&field.name).unwrap_or(&Value::Nil);
            members.push(format!("{}: {}", member(&field.name), self.value(&field.ty, value)?));
        }
        if entity.is_fungible() {
            members.push("_token_id: 0".to_string());
        }
        Ok(format!("{}({{{}}})", self.struct_name(record.ty())?, members.join(", ")))
    }

    /// Registers an initializer function for a list literal and returns the
    /// call expression.
    fn array(&mut self, element: &FieldType, items: &[Value]) -> Result<String> {
        let mut rendered = Vec::with_capacity(items.len());
        for item in items {
            rendered.push(self.value(element, item)?);
        }
        self.next_array += 1;
        let name = format!("get_array_{}", self.next_array);
        let element_ty = self.sol_type(element)?;

        let mut src = SourceBuilder::new();
        src.open(format!(
            "function {name}() internal pure returns ({element_ty}[] memory _arr) {{"
        ))
        .line(format!("_arr = new {element_ty}[]({});", items.len()));
        for (i, item) in rendered.iter().enumerate() {
            src.line(format!("_arr[{i}] = {item};"));
        }
        src.close("}");
        self.arrays.push(src.finish());
        Ok(format!("{name}()"))
    }

    fn drain_arrays(&mut self, src: &mut SourceBuilder) {
        for function in self.arrays.drain(..) {
            src.blank();
            for line in function.lines() {
                src.line(line);
            }
        }
    }
}

// =============================================================================
// Contracts
// =============================================================================

fn header(path: &str) -> SourceBuilder {
    let mut src = SourceBuilder::new();
    src.line(format!("// contracts/generated/{path}"))
        .line(LICENSE)
        .blank()
        .line(PRAGMA)
        .blank();
    src
}

fn instance_of(model: &ResolvedModel, key: InstanceKey) -> Result<&Instance> {
    model
        .instance(key)
        .ok_or_else(|| Error::internal(format!("no instance {} of {}", key.ordinal, key.ty)))
}

fn data_contract(model: &ResolvedModel, ty: EntityTypeId) -> Result<String> {
    Ok(format!("{}Data", model.canonical_name(ty)?))
}

fn has_data_contract(model: &ResolvedModel, ty: EntityTypeId) -> bool {
    matches!(
        model.classify(ty),
        Some(Category::StaticData | Category::LadderData)
    )
}

fn inventory(model: &ResolvedModel) -> Result<String> {
    let mut src = header("Inventory.sol");
    src.line("import \"@openzeppelin/contracts-upgradeable/token/ERC1155/ERC1155Upgradeable.sol\";")
        .blank();
    for &key in model.fungible_instances() {
        let instance = instance_of(model, key)?;
        let token = model
            .token_id(key)
            .ok_or_else(|| Error::internal(format!("fungible instance {} has no token id", instance.id())))?;
        src.line(format!(
            "uint constant {}_{} = {token};",
            model.identifier_name(key.ty)?.to_ascii_uppercase(),
            sol_ident(instance.id()).to_ascii_uppercase()
        ));
    }
    src.blank()
        .open("contract Inventory is ERC1155Upgradeable {")
        .close("}");
    Ok(src.finish())
}

fn data_source(model: &ResolvedModel, ty: EntityTypeId) -> Result<String> {
    let mut sol = Sol::new(model);
    let entity = model.entity(ty)?;
    let contract = data_contract(model, ty)?;
    let ident = sol.ident(ty)?;
    let st = sol.struct_name(ty)?;
    let table = format!("_{}", model.names(ty)?.canonical_plural.to_snake_case());
    let instances = model.instances_of(ty);

    let mut src = header(&format!("data/{contract}.sol"));
    src.open(format!("contract {contract} {{")).blank();
    sol.struct_defs(&mut src, ty)?;
    src.line(format!("mapping(uint => {st}) {table};")).blank();

    src.open(format!("function initialize_{contract}() public {{"));
    for instance in instances {
        src.line(format!(
            "{table}[{}] = {}();",
            instance.ordinal(),
            sol_ident(instance.id())
        ));
    }
    src.close("}").blank();

    src.open(format!(
        "function get_{ident}_by_id(uint _id) external view returns ({st} memory) {{"
    ))
    .line(format!("return {table}[_id];"))
    .close("}");

    for field in entity.fields() {
        // Solidity cannot return mappings.
        if matches!(field.ty, FieldType::Map(..)) {
            continue;
        }
        src.blank()
            .open(format!(
                "function get_{ident}_{}_by_id(uint _id) external view returns ({}) {{",
                field.name,
                sol.param_type(&field.ty)?
            ))
            .line(format!("return {table}[_id].{};", member(&field.name)))
            .close("}");
    }
    if entity.is_fungible() {
        src.blank()
            .open(format!(
                "function get_{ident}_token_id_by_id(uint _id) external view returns (uint) {{"
            ))
            .line(format!("return {table}[_id]._token_id;"))
            .close("}");
    }

    for instance in instances {
        src.blank().open(format!(
            "function {}() public pure returns ({st} memory _{ident}) {{",
            sol_ident(instance.id())
        ));
        for field in entity.fields() {
            let value = instance.record().get(&field.name).unwrap_or(&Value::Nil);
            let rendered = sol.value(&field.ty, value).map_err(|e| {
                e.with_context(model.context_for(instance.key()).with_field(field.name.as_ref()))
            })?;
            src.line(format!("_{ident}.{} = {rendered};", member(&field.name)));
        }
        if let Some(token) = model.token_id(instance.key()) {
            src.line(format!("_{ident}._token_id = {token};"));
        }
        src.close("}");
        sol.drain_arrays(&mut src);
    }

    src.close("}");
    Ok(src.finish())
}

fn ladder_source(model: &ResolvedModel, ty: EntityTypeId) -> Result<String> {
    let mut sol = Sol::new(model);
    let entity = model.entity(ty)?;
    let level_ty = model
        .ladder_level_type(ty)
        .ok_or_else(|| Error::missing_field(entity.name(), LEVELS_FIELD))?;
    let contract = data_contract(model, ty)?;
    let ident = sol.ident(ty)?;
    let level_ident = sol.ident(level_ty)?;
    let level_st = sol.struct_name(level_ty)?;
    let levels = format!("_{ident}_levels");
    let max = format!("_{ident}_max_level");

    let mut src = header(&format!("data/{contract}.sol"));
    src.open(format!("contract {contract} {{")).blank();
    sol.struct_defs(&mut src, level_ty)?;
    src.line(format!("mapping (uint => mapping (uint => {level_st})) {levels};"))
        .line(format!("mapping (uint => uint) {max};"))
        .blank();

    src.open(format!(
        "function get_{level_ident}(uint _id, uint level) external view returns ({level_st} memory) {{"
    ))
    .line(format!("return {levels}[_id][level];"))
    .close("}")
    .blank();

    // Clamped at the last defined level.
    src.open("function get_level(uint _id, uint curr_level, uint exp) external view returns (uint _level, uint _exp_left) {")
        .line(format!("uint _max = {max}[_id];"))
        .line("_level = curr_level < _max ? curr_level : _max;")
        .open(format!(
            "while (_level < _max && exp >= {levels}[_id][_level].{EXPERIENCE_FIELD}) {{"
        ))
        .line("_level += 1;")
        .close("}")
        .line("_exp_left = exp;")
        .open("if (_level > 0) {")
        .line(format!("uint _reached = {levels}[_id][_level - 1].{EXPERIENCE_FIELD};"))
        .line("_exp_left = exp >= _reached ? exp - _reached : 0;")
        .close("}")
        .close("}");

    let level_field = FieldType::embedded(level_ty);
    for instance in model.instances_of(ty) {
        let table = model.ladder_table(instance.key()).ok_or_else(|| {
            Error::internal("ladder instance without a threshold table")
                .with_context(model.context_for(instance.key()))
        })?;
        let ordinal = instance.ordinal();
        src.blank().open(format!(
            "function initialize_{ident}_{}() public {{",
            sol_ident(instance.id())
        ));
        let entries = instance
            .record()
            .get(LEVELS_FIELD)
            .and_then(Value::as_list)
            .map(|levels| levels.iter().cloned().collect::<Vec<_>>())
            .unwrap_or_default();
        for (i, level) in entries.iter().enumerate() {
            let rendered = sol.value(&level_field, level).map_err(|e| {
                e.with_context(
                    model
                        .context_for(instance.key())
                        .with_field(format!("{LEVELS_FIELD}[{i}]")),
                )
            })?;
            src.line(format!("{levels}[{ordinal}][{i}] = {rendered};"));
        }
        src.blank()
            .line(format!("{max}[{ordinal}] = {};", table.max_level()))
            .close("}");
        sol.drain_arrays(&mut src);
    }

    src.close("}");
    Ok(src.finish())
}

fn model_source(model: &ResolvedModel, ty: EntityTypeId) -> Result<String> {
    let mut sol = Sol::new(model);
    let entity = model.entity(ty)?;
    let canonical = model.canonical_name(ty)?;
    let names = model.names(ty)?;
    let ident = names.identifier.as_str();
    let plural = names.identifier_plural.as_str();
    let data = model
        .data_type_of(ty)
        .ok_or_else(|| Error::missing_field(entity.name(), DATA_FIELD))?;
    let data_ident = sol.ident(data)?;

    // Models laid out in this contract: embedded models first, then `ty`.
    let deps = model.dependencies_of(ty)?;
    let mut laid_out: Vec<EntityTypeId> = deps
        .layout_order
        .iter()
        .copied()
        .filter(|t| deps.transitive.contains(t))
        .collect();
    laid_out.push(ty);

    let mut data_deps = BTreeSet::new();
    for &m in &laid_out {
        for &target in &model.dependencies_of(m)?.direct {
            if has_data_contract(model, target) {
                data_deps.insert(target);
            }
        }
    }
    let ladder = if entity.field(EXP_FIELD).is_some() {
        model.ladder_type_of(data)
    } else {
        None
    };
    data_deps.extend(ladder);

    let mut src = header(&format!("model/{canonical}.sol"));
    src.line("import \"@openzeppelin/contracts/utils/math/SafeMath.sol\";")
        .blank()
        .line("import \"../../XDimERC721.sol\";");
    for &dep in &data_deps {
        src.line(format!("import \"../data/{}.sol\";", data_contract(model, dep)?));
    }
    src.blank()
        .open(format!("contract {canonical} is XDimERC721 {{"))
        .blank()
        .line("using SafeMath for uint;")
        .blank();

    sol.struct_defs(&mut src, ty)?;
    for &dep in &data_deps {
        src.line(format!("{} public {};", data_contract(model, dep)?, sol.ident(dep)?));
    }
    src.blank()
        .line(format!("event {canonical}Added(address _receiver);"))
        .blank();
    for &m in &laid_out {
        src.line(format!(
            "{}[] public {};",
            sol.struct_name(m)?,
            model.names(m)?.identifier_plural
        ));
    }
    for &m in &laid_out {
        create_function(&mut sol, &mut src, m)?;
    }

    src.blank().line("function initialize(");
    let count = data_deps.len();
    for (i, &dep) in data_deps.iter().enumerate() {
        let sep = if i + 1 == count { "" } else { "," };
        src.line(format!(
            "    {} _{}{sep}",
            data_contract(model, dep)?,
            sol.ident(dep)?
        ));
    }
    src.open(") initializer public {").line(format!(
        "__ERC721_init(\"{canonical}\", \"{}\");",
        canonical.to_ascii_uppercase()
    ));
    for &dep in &data_deps {
        let var = sol.ident(dep)?;
        src.line(format!("{var} = _{var};"));
    }
    src.close("}").blank();

    src.open(format!("function mint(address to, uint {data_ident}_id) public {{"))
        .line("uint token_id = totalSupply();")
        .line("_mint(to, token_id);")
        .line(format!("create_{ident}({data_ident}_id);"))
        .line(format!("emit {canonical}Added(to);"))
        .close("}")
        .blank()
        .open(format!(
            "function give(address to, uint {data_ident}_id, uint amount) public {{"
        ))
        .open("for (uint i = 0; i < amount; i++) {")
        .line(format!("mint(to, {data_ident}_id);"))
        .close("}")
        .close("}");

    if let Some(ladder) = ladder {
        let ladder_ident = sol.ident(ladder)?;
        src.blank()
            .open(format!("function add_exp(uint {ident}_id, uint _exp) public {{"))
            .line(format!("{ident}_t storage {ident} = {plural}[{ident}_id];"))
            .line(format!("{ident}.{EXP_FIELD} = {ident}.{EXP_FIELD}.add(_exp);"))
            .line("uint _new_level;")
            .line("uint _exp_left;")
            .line(format!(
                "uint ladder_id = {data_ident}.get_{data_ident}_{LADDER_FIELD}_by_id({ident}.{DATA_FIELD});"
            ))
            .line(format!(
                "(_new_level, _exp_left) = {ladder_ident}.get_level(ladder_id, {ident}.level, {ident}.{EXP_FIELD});"
            ))
            .line(format!("{ident}.level = _new_level;"))
            .close("}");
    }

    src.close("}");
    Ok(src.finish())
}

/// `create_<model>`: builds a model record from its data id and returns its
/// index. List fields mirrored from the data type create one embedded model
/// per listed id.
fn create_function(sol: &mut Sol<'_>, src: &mut SourceBuilder, ty: EntityTypeId) -> Result<()> {
    let model = sol.model;
    let Some(data) = model.data_type_of(ty) else {
        return Ok(());
    };
    let entity = model.entity(ty)?;
    let data_entity = model.entity(data)?;
    let names = model.names(ty)?;
    let ident = names.identifier.as_str();
    let data_ident = sol.ident(data)?;

    src.blank()
        .open(format!(
            "function create_{ident}(uint {data_ident}_id) internal returns (uint _id) {{"
        ))
        .line(format!("_id = {}.length;", names.identifier_plural))
        .line(format!("{ident}_t memory {ident};"));

    for field in entity.fields() {
        let name = member(&field.name);
        if field.name.as_ref() == DATA_FIELD {
            src.line(format!("{ident}.{name} = {data_ident}_id;"));
            continue;
        }
        if let Some(default) = field.default.as_ref().filter(|d| !d.is_nil()) {
            let rendered = sol.value(&field.ty, default)?;
            src.line(format!("{ident}.{name} = {rendered};"));
            continue;
        }
        let mirrored = data_entity
            .field(&field.name)
            .is_some_and(|f| matches!(f.ty, FieldType::List(_)));
        if let (FieldType::List(element), true) = (&field.ty, mirrored) {
            if let FieldType::Embedded(element) = element.as_ref() {
                if model.data_type_of(*element).is_some() {
                    let element_ident = sol.ident(*element)?;
                    src.line(format!(
                        "uint[] memory {name} = {data_ident}.get_{data_ident}_{}_by_id({data_ident}_id);",
                        field.name
                    ))
                    .line(format!("{ident}.{name} = new uint[]({name}.length);"))
                    .open(format!("for (uint i = 0; i < {name}.length; i++) {{"))
                    .line(format!("{ident}.{name}[i] = create_{element_ident}({name}[i]);"))
                    .close("}");
                }
            }
        }
    }

    src.line(format!("{}.push({ident});", names.identifier_plural))
        .close("}");
    sol.drain_arrays(src);
    Ok(())
}

fn visitor_source(model: &ResolvedModel, base: EntityTypeId, variants: &[EntityTypeId]) -> Result<String> {
    let sol = Sol::new(model);
    let canonical = model.canonical_name(base)?;
    let lower = canonical.to_snake_case();
    let upper = lower.to_ascii_uppercase();
    let library = format!("{canonical}Lib");

    let mut src = header(&format!("visitors/{canonical}Visitor.sol"));
    src.line("import \"../../SerDes.sol\";").blank();
    for &variant in variants {
        let tag = model
            .variant_tag(base, variant)
            .ok_or_else(|| Error::internal(format!("{} is not a variant", model.schema().name_of(variant))))?;
        src.line(format!(
            "uint constant {upper}_TYPE_{} = {tag};",
            sol.ident(variant)?.to_ascii_uppercase()
        ));
    }

    src.blank()
        .open(format!("library {library} {{"))
        .blank()
        .line("using SerDes for bytes;")
        .blank();
    for &variant in variants {
        sol.struct_def(&mut src, variant)?;
        src.blank();
    }
    for &variant in variants {
        let entity = model.entity(variant)?;
        let v = sol.ident(variant)?;
        src.open(format!(
            "function load_{v}(bytes memory _data, uint _off) internal pure returns ({v}_t memory _{v}, uint off) {{"
        ))
        .line("off = _off;");
        for field in entity.fields() {
            let loader = match &field.ty {
                FieldType::Scalar(Scalar::Int) | FieldType::Reference(_) => "uint",
                FieldType::Scalar(Scalar::String) => "string",
                other => {
                    return Err(Error::invalid_schema(format!(
                        "variant field {}.{} has undecodable type {}",
                        entity.name(),
                        field.name,
                        model.schema().describe(other)
                    )));
                }
            };
            src.line(format!(
                "(_{v}.{}, off) = _data.load_{loader}(off);",
                member(&field.name)
            ));
        }
        src.close("}").blank();
    }
    src.close("}").blank();

    src.open(format!("contract {canonical}Visitor {{"))
        .blank()
        .line("using SerDes for bytes;")
        .line(format!("using {library} for bytes;"))
        .blank()
        .open(format!("function visit(bytes memory _{lower}_bytes) public {{"))
        .line("uint off = 0;")
        .line("uint _type;")
        .line(format!("(_type, off) = _{lower}_bytes.load_uint(off);"));
    for (i, &variant) in variants.iter().enumerate() {
        let v = sol.ident(variant)?;
        let keyword = if i == 0 { "if" } else { "else if" };
        src.open(format!(
            "{keyword} (_type == {upper}_TYPE_{}) {{",
            v.to_ascii_uppercase()
        ))
        .line(format!("{library}.{v}_t memory _{v};"))
        .line(format!("(_{v}, off) = _{lower}_bytes.load_{v}(off);"))
        .line(format!("visit_{v}(_{v});"))
        .close("}");
    }
    src.close("}");
    for &variant in variants {
        let v = sol.ident(variant)?;
        src.blank()
            .open(format!(
                "function visit_{v}({library}.{v}_t memory _{v}) internal {{"
            ))
            .close("}");
    }
    src.close("}");
    Ok(src.finish())
}

fn game_data(model: &ResolvedModel, data_contracts: &[EntityTypeId]) -> Result<String> {
    let mut src = header("GameData.sol");
    for &ty in data_contracts {
        src.line(format!("import \"./data/{}.sol\";", data_contract(model, ty)?));
    }
    src.blank().open("contract GameData {");
    for &ty in data_contracts {
        if model.classify(ty) != Some(Category::StaticData) {
            continue;
        }
        let contract = data_contract(model, ty)?;
        let ident = model.identifier_name(ty)?;
        src.blank()
            .line(format!("{contract} public _{ident};"))
            .blank()
            .open(format!(
                "function get_{ident}_by_id(uint _id) external view returns ({contract}.{ident}_t memory) {{"
            ))
            .line(format!("return _{ident}.get_{ident}_by_id(_id);"))
            .close("}");
    }
    src.close("}");
    Ok(src.finish())
}

fn game_logic(model: &ResolvedModel, models: &[EntityTypeId]) -> Result<String> {
    let mut src = header("GameLogicBase.sol");
    src.line("import \"@openzeppelin/contracts-upgradeable/proxy/utils/Initializable.sol\";")
        .line("import \"@openzeppelin/contracts/token/ERC20/IERC20.sol\";")
        .line("import \"@openzeppelin/contracts/utils/math/SafeMath.sol\";")
        .blank()
        .line("import \"./Inventory.sol\";")
        .line("import \"./GameData.sol\";");
    for &ty in models {
        src.line(format!("import \"./model/{}.sol\";", model.canonical_name(ty)?));
    }
    src.blank();
    for (i, &ty) in models.iter().enumerate() {
        src.line(format!(
            "uint constant ASSET_TYPE_{} = {i};",
            model.canonical_name(ty)?.to_snake_case().to_ascii_uppercase()
        ));
    }

    src.blank()
        .open("contract GameLogicBase is Initializable {")
        .blank()
        .line("using SafeMath for uint;")
        .blank()
        .line("GameData public gdata;")
        .line("Inventory public inventory;");
    for &ty in models {
        src.line(format!(
            "{} public {};",
            model.canonical_name(ty)?,
            model.names(ty)?.identifier_plural
        ));
    }

    src.blank()
        .line("function initialize(")
        .line("    GameData _gdata,")
        .line(format!("    Inventory _inventory{}", if models.is_empty() { "" } else { "," }));
    for (i, &ty) in models.iter().enumerate() {
        let sep = if i + 1 == models.len() { "" } else { "," };
        src.line(format!(
            "    {} _{}{sep}",
            model.canonical_name(ty)?,
            model.names(ty)?.identifier_plural
        ));
    }
    src.open(") public {")
        .line("gdata = _gdata;")
        .line("inventory = _inventory;");
    for &ty in models {
        let plural = &model.names(ty)?.identifier_plural;
        src.line(format!("{plural} = _{plural};"));
    }
    src.close("}");

    for &ty in models {
        let entity = model.entity(ty)?;
        let levels_up = entity.field(EXP_FIELD).is_some()
            && model.data_type_of(ty).and_then(|d| model.ladder_type_of(d)).is_some();
        let Some(material) = model.upgrade_material_for(ty).filter(|_| levels_up) else {
            continue;
        };
        if model.entity(material)?.field(VALUE_FIELD).is_none() {
            continue;
        }
        let ident = model.identifier_name(ty)?;
        let plural = &model.names(ty)?.identifier_plural;
        let mat = model.identifier_name(material)?;
        src.blank()
            .open(format!(
                "function _{ident}_use_exp_material(address _user, uint {ident}_id, uint mat_id, uint amount) internal {{"
            ))
            .line(format!(
                "{}.{mat}_t memory {mat} = gdata.get_{mat}_by_id(mat_id);",
                data_contract(model, material)?
            ))
            .line(format!("require(inventory.balanceOf(_user, {mat}._token_id) >= amount);"))
            .line(format!("uint exp = {mat}.{VALUE_FIELD}.mul(amount);"))
            .line(format!("{plural}.add_exp({ident}_id, exp);"))
            .close("}");
    }

    for &ty in models {
        let data = model
            .data_type_of(ty)
            .ok_or_else(|| Error::missing_field(model.schema().name_of(ty), DATA_FIELD))?;
        let data_ident = model.identifier_name(data)?;
        src.blank()
            .open(format!(
                "function _give_{}(address to, uint {data_ident}_id, uint amount) internal {{",
                model.canonical_name(ty)?.to_snake_case()
            ))
            .line(format!(
                "{}.give(to, {data_ident}_id, amount);",
                model.names(ty)?.identifier_plural
            ))
            .close("}");
    }

    src.close("}");
    Ok(src.finish())
}

// =============================================================================
// Identifiers
// =============================================================================

/// A Solidity identifier for an instance id.
fn sol_ident(id: &str) -> String {
    let mut ident: String = id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    ident
}

/// Struct member name of a field; `type` is reserved.
fn member(field: &str) -> String {
    if field == "type" {
        format!("_{field}")
    } else {
        field.to_string()
    }
}

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
}
