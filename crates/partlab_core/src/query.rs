use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::{
    AttributeDefinition, AttributeValue, CatalogError, CatalogResult, DataType, DefinitionId,
};

/// Filter operators. Which operators a clause may use is a strict function of
/// the referenced definition's data type (`is_legal_for`); nothing else in
/// the codebase re-derives that mapping.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    Gte,
    Lte,
    Between,
    WithinRange,
    Contains,
    IsTrue,
    IsFalse,
    Eq,
    In,
    HasAll,
    HasAny,
}

impl FilterOperator {
    pub fn is_legal_for(self, data_type: DataType) -> bool {
        match data_type {
            DataType::Decimal | DataType::Integer => {
                matches!(self, Self::Gte | Self::Lte | Self::Between)
            }
            DataType::Range => matches!(self, Self::WithinRange),
            DataType::Str => matches!(self, Self::Contains),
            DataType::Bool => matches!(self, Self::IsTrue | Self::IsFalse),
            DataType::Select => matches!(self, Self::Eq | Self::In),
            DataType::MultiSelect => matches!(self, Self::HasAll | Self::HasAny),
        }
    }
}

/// Typed clause operand. Numeric operands are canonical base-unit values, so
/// a query expressed in mA filters identically to one expressed in A.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum FilterOperand {
    Number(Decimal),
    Text(String),
    List(Vec<String>),
}

/// One conjunctive filter clause; clauses AND together across a search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterClause {
    pub definition_id: DefinitionId,
    pub operator: FilterOperator,
    pub value: Option<FilterOperand>,
    pub value_to: Option<FilterOperand>,
}

impl FilterClause {
    fn number(&self) -> CatalogResult<Decimal> {
        match &self.value {
            Some(FilterOperand::Number(value)) => Ok(*value),
            _ => Err(CatalogError::invalid(format!(
                "operator {:?} needs a numeric operand",
                self.operator
            ))),
        }
    }

    fn number_to(&self) -> CatalogResult<Decimal> {
        match &self.value_to {
            Some(FilterOperand::Number(value)) => Ok(*value),
            _ => Err(CatalogError::invalid(
                "operator between needs a numeric upper bound",
            )),
        }
    }

    fn text(&self) -> CatalogResult<&str> {
        match &self.value {
            Some(FilterOperand::Text(value)) => Ok(value),
            _ => Err(CatalogError::invalid(format!(
                "operator {:?} needs a text operand",
                self.operator
            ))),
        }
    }

    fn list(&self) -> CatalogResult<&[String]> {
        match &self.value {
            Some(FilterOperand::List(values)) if !values.is_empty() => Ok(values),
            _ => Err(CatalogError::invalid(format!(
                "operator {:?} needs a non-empty list operand",
                self.operator
            ))),
        }
    }
}

/// Case-insensitive match key: NFC-normalized, trimmed, lowercased.
pub fn normalize_match_text(value: &str) -> String {
    value.trim().nfc().collect::<String>().to_lowercase()
}

/// Reject a clause whose operator, operand shape, or target definition is
/// unusable. Runs before any row is fetched; an illegal clause is an error,
/// never silently ignored.
pub fn validate_clause(
    definition: &AttributeDefinition,
    clause: &FilterClause,
) -> CatalogResult<()> {
    if !definition.is_filterable {
        return Err(CatalogError::invalid(format!(
            "attribute '{}' is not filterable",
            definition.name
        )));
    }
    if !clause.operator.is_legal_for(definition.data_type) {
        return Err(CatalogError::invalid(format!(
            "operator {:?} is not valid for {:?} attribute '{}'",
            clause.operator, definition.data_type, definition.name
        ))
        .with_details(serde_json::json!({
            "definitionId": definition.definition_id,
            "dataType": definition.data_type,
        })));
    }
    match clause.operator {
        FilterOperator::Gte | FilterOperator::Lte | FilterOperator::WithinRange => {
            clause.number().map(|_| ())
        }
        FilterOperator::Between => {
            clause.number()?;
            clause.number_to().map(|_| ())
        }
        FilterOperator::Contains | FilterOperator::Eq => clause.text().map(|_| ()),
        FilterOperator::IsTrue | FilterOperator::IsFalse => Ok(()),
        FilterOperator::In | FilterOperator::HasAll | FilterOperator::HasAny => {
            clause.list().map(|_| ())
        }
    }
}

/// Evaluate one validated clause against one stored value row. Comparisons
/// run on canonical base-unit decimals, so stored and queried prefixes never
/// influence the result.
pub fn clause_matches(clause: &FilterClause, stored: &AttributeValue) -> CatalogResult<bool> {
    match clause.operator {
        FilterOperator::Gte => Ok(stored.single()? >= clause.number()?),
        FilterOperator::Lte => Ok(stored.single()? <= clause.number()?),
        FilterOperator::Between => {
            let value = stored.single()?;
            Ok(value >= clause.number()? && value <= clause.number_to()?)
        }
        FilterOperator::WithinRange => {
            let (min, max) = stored.bounds()?;
            let probe = clause.number()?;
            Ok(probe >= min && probe <= max)
        }
        FilterOperator::Contains => {
            let haystack = normalize_match_text(stored.text()?);
            let needle = normalize_match_text(clause.text()?);
            Ok(haystack.contains(&needle))
        }
        FilterOperator::IsTrue => Ok(stored.text()? == "true"),
        FilterOperator::IsFalse => Ok(stored.text()? == "false"),
        FilterOperator::Eq => Ok(stored.text()? == clause.text()?),
        FilterOperator::In => {
            let stored_choice = stored.text()?;
            Ok(clause.list()?.iter().any(|choice| choice == stored_choice))
        }
        FilterOperator::HasAll => {
            let choices = stored.choices()?;
            Ok(clause
                .list()?
                .iter()
                .all(|wanted| choices.iter().any(|choice| choice == wanted)))
        }
        FilterOperator::HasAny => {
            let choices = stored.choices()?;
            Ok(clause
                .list()?
                .iter()
                .any(|wanted| choices.iter().any(|choice| choice == wanted)))
        }
    }
}
