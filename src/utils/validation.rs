//! Utilidades de validación
//!
//! Funciones helper para validar datos de entrada antes de abrir cualquier
//! transacción. Un dato inválido nunca llega a la base de datos.

use rust_decimal::Decimal;

use crate::models::vehicle::NewVehicle;
use crate::utils::errors::AppError;

/// Validar que un campo de texto no esté vacío
pub fn validate_not_empty(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} cannot be empty", field)));
    }
    Ok(())
}

/// Validar los datos comunes de un vehículo (modelo, tipo, tarifa diaria)
pub fn validate_vehicle_details(
    model: &str,
    vehicle_type: &str,
    rent_per_day: Decimal,
) -> Result<(), AppError> {
    validate_not_empty("model", model)?;
    validate_not_empty("type", vehicle_type)?;
    if rent_per_day <= Decimal::ZERO {
        return Err(AppError::Validation(
            "rent per day must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Validar un alta de vehículo completa
pub fn validate_new_vehicle(new: &NewVehicle) -> Result<(), AppError> {
    validate_vehicle_details(&new.model, &new.vehicle_type, new.rent_per_day)?;
    if new.quantity < 1 {
        return Err(AppError::Validation(
            "quantity must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Validar el nombre de usuario que se atribuye en el libro de alquileres
pub fn validate_username(username: &str) -> Result<(), AppError> {
    validate_not_empty("username", username)
}
