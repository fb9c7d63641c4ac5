use crate::{si, AttributeDefinition, AttributeValue, CatalogResult, DataType, Subject};

const DECIMAL_PLACES: u32 = 2;
const INTEGER_PLACES: u32 = 0;

/// Render one stored value for label composition, per the definition's data
/// type and unit.
pub fn format_attribute_value(
    definition: &AttributeDefinition,
    value: &AttributeValue,
) -> CatalogResult<String> {
    let unit = definition.unit.as_deref();
    Ok(match definition.data_type {
        DataType::Decimal => {
            si::format_quantity(value.single()?, value.prefix, DECIMAL_PLACES, unit)?
        }
        DataType::Integer => {
            si::format_quantity(value.single()?, value.prefix, INTEGER_PLACES, unit)?
        }
        DataType::Range => {
            let (min, max) = value.bounds()?;
            let low = si::denormalize(min, value.prefix)?.round_dp(DECIMAL_PLACES);
            let high = si::denormalize(max, value.prefix)?.round_dp(DECIMAL_PLACES);
            format!(
                "{low:.prec$}–{high:.prec$}{}{}",
                value.prefix.symbol(),
                unit.unwrap_or(""),
                prec = DECIMAL_PLACES as usize,
            )
        }
        DataType::Str | DataType::Bool | DataType::Select => value.text()?.to_string(),
        DataType::MultiSelect => value.choices()?.join(", "),
    })
}

/// Derive the human-readable label of a subject: explicit localized name
/// first, then every label attribute in definition sort order, then the
/// package name, joined with " / ". Subjects where nothing resolves fall
/// back to their slug. `values` must already be ordered by definition
/// sort order.
pub fn compose_display_name(
    subject: &Subject,
    locale: &str,
    values: &[(AttributeDefinition, AttributeValue)],
) -> CatalogResult<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(name) = subject.name.resolve(locale) {
        parts.push(name.to_string());
    }
    for (definition, value) in values {
        if !definition.is_label {
            continue;
        }
        let formatted = format_attribute_value(definition, value)?;
        if !formatted.is_empty() {
            parts.push(formatted);
        }
    }
    if let Some(package) = subject.package_name.as_deref() {
        if !package.trim().is_empty() {
            parts.push(package.trim().to_string());
        }
    }
    if parts.is_empty() {
        return Ok(subject.slug.clone());
    }
    Ok(parts.join(" / "))
}

#[cfg(test)]
mod tests {
    use super::{compose_display_name, format_attribute_value};
    use crate::{
        AttrValue, AttributeDefinition, AttributeValue, CategoryId, DataType, DefinitionId, Id,
        LocalizedText, Scope, SiPrefix, Subject, SubjectId, SubjectKind, ValueId,
    };
    use rust_decimal::Decimal;

    fn definition(
        name: &str,
        data_type: DataType,
        unit: Option<&str>,
        is_label: bool,
        sort_order: i32,
    ) -> AttributeDefinition {
        AttributeDefinition {
            definition_id: DefinitionId(Id::new()),
            category_id: CategoryId(Id::new()),
            name: name.to_string(),
            display_name: LocalizedText::single("en", name),
            unit: unit.map(str::to_string),
            data_type,
            scope: Scope::Both,
            is_filterable: true,
            is_required: is_label,
            is_label,
            allowed_prefixes: Vec::new(),
            allowed_values: Vec::new(),
            sort_order,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn attach(definition: &AttributeDefinition, value: AttrValue) -> AttributeValue {
        let payload = value.normalize().expect("normalize");
        AttributeValue {
            value_id: ValueId(Id::new()),
            definition_id: definition.definition_id,
            subject_id: SubjectId(Id::new()),
            subject_kind: SubjectKind::Component,
            normalized_value: payload.normalized_value,
            normalized_min: payload.normalized_min,
            normalized_max: payload.normalized_max,
            prefix: payload.prefix,
            string_value: payload.string_value,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn subject(name: LocalizedText, package_name: Option<&str>) -> Subject {
        Subject {
            subject_id: SubjectId(Id::new()),
            kind: SubjectKind::Component,
            category_id: CategoryId(Id::new()),
            name,
            slug: "resistor-4k7".to_string(),
            package_name: package_name.map(str::to_string),
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn composes_label_attributes_in_sort_order() {
        let resistance = definition("resistance", DataType::Decimal, Some("Ω"), true, 0);
        let power = definition("power", DataType::Decimal, Some("W"), true, 1);
        let values = vec![
            (
                resistance.clone(),
                attach(
                    &resistance,
                    AttrValue::Decimal {
                        value: Decimal::new(47, 1),
                        prefix: SiPrefix::Kilo,
                    },
                ),
            ),
            (
                power.clone(),
                attach(
                    &power,
                    AttrValue::Decimal {
                        value: Decimal::new(25, 2),
                        prefix: SiPrefix::Base,
                    },
                ),
            ),
        ];
        let name =
            compose_display_name(&subject(LocalizedText::new(), None), "en", &values).unwrap();
        assert_eq!(name, "4.70kΩ / 0.25W");
    }

    #[test]
    fn explicit_name_and_package_wrap_the_labels() {
        let resistance = definition("resistance", DataType::Decimal, Some("Ω"), true, 0);
        let values = vec![(
            resistance.clone(),
            attach(
                &resistance,
                AttrValue::Decimal {
                    value: Decimal::from(330),
                    prefix: SiPrefix::Base,
                },
            ),
        )];
        let subject = subject(LocalizedText::single("en", "CF series"), Some("0805"));
        let name = compose_display_name(&subject, "en", &values).unwrap();
        assert_eq!(name, "CF series / 330.00Ω / 0805");
    }

    #[test]
    fn non_label_values_are_skipped() {
        let through_hole = definition("throughHole", DataType::Bool, None, false, 0);
        let values = vec![(through_hole.clone(), attach(&through_hole, AttrValue::Bool(true)))];
        let name =
            compose_display_name(&subject(LocalizedText::new(), None), "en", &values).unwrap();
        assert_eq!(name, "resistor-4k7");
    }

    #[test]
    fn falls_back_to_slug_when_nothing_resolves() {
        let name =
            compose_display_name(&subject(LocalizedText::new(), None), "en", &[]).unwrap();
        assert_eq!(name, "resistor-4k7");
    }

    #[test]
    fn integer_and_range_formatting() {
        let pins = definition("pins", DataType::Integer, None, true, 0);
        let formatted =
            format_attribute_value(&pins, &attach(&pins, AttrValue::Integer {
                value: Decimal::from(64),
                prefix: SiPrefix::Base,
            }))
            .unwrap();
        assert_eq!(formatted, "64");

        let span = definition("temperature", DataType::Range, Some("°C"), true, 0);
        let formatted = format_attribute_value(
            &span,
            &attach(
                &span,
                AttrValue::Range {
                    min: Decimal::from(-40),
                    max: Decimal::from(125),
                    prefix: SiPrefix::Base,
                },
            ),
        )
        .unwrap();
        assert_eq!(formatted, "-40.00–125.00°C");
    }
}
